use super::entities::Value;

/// Highest hand value that isn't a bust.
pub const BLACKJACK: Value = 21;

/// The dealer draws while below this value and stands at or above it.
pub const DEALER_STAND_THRESHOLD: Value = 17;

/// Cards dealt to each side at the start of a round.
pub const INITIAL_HAND_SIZE: usize = 2;
