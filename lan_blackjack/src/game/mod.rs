//! Blackjack rules and the dealer's round state machine.
//!
//! - Cards, decks and hands with fixed ace-high scoring
//! - The dealer-authoritative [`round::RoundEngine`]
//! - Decision sources and presentation events for the player side
//! - Session statistics

pub mod constants;
pub mod decision;
pub mod entities;
pub mod events;
pub mod round;
pub mod stats;
