//! Sources of player decisions.

use super::{
    constants::DEALER_STAND_THRESHOLD,
    entities::{Card, Decision, Hand, Value},
};

/// What the player can see when it's their turn.
#[derive(Clone, Copy, Debug)]
pub struct TurnView<'a> {
    pub player: &'a Hand,
    pub dealer_up: Card,
}

/// Anything that can answer hit or stand: a human at a terminal, a bot,
/// or a scripted test double.
pub trait DecisionSource {
    fn decide(&mut self, view: &TurnView<'_>) -> Decision;
}

/// Automated player that hits while its hand is below a threshold.
///
/// The default threshold plays the dealer's own rule.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HitBelow(pub Value);

impl Default for HitBelow {
    fn default() -> Self {
        Self(DEALER_STAND_THRESHOLD)
    }
}

impl DecisionSource for HitBelow {
    fn decide(&mut self, view: &TurnView<'_>) -> Decision {
        if view.player.value() < self.0 {
            Decision::Hit
        } else {
            Decision::Stand
        }
    }
}

/// Plays a fixed list of decisions, then stands.
#[derive(Clone, Debug, Default)]
pub struct Scripted {
    decisions: Vec<Decision>,
}

impl Scripted {
    pub fn new(decisions: impl IntoIterator<Item = Decision>) -> Self {
        let mut decisions: Vec<Decision> = decisions.into_iter().collect();
        decisions.reverse();
        Self { decisions }
    }
}

impl DecisionSource for Scripted {
    fn decide(&mut self, _view: &TurnView<'_>) -> Decision {
        self.decisions.pop().unwrap_or(Decision::Stand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Suit;

    fn hand(ranks: &[u8]) -> Hand {
        ranks
            .iter()
            .map(|&rank| Card::new(rank, Suit::Club).unwrap())
            .collect()
    }

    #[test]
    fn hit_below_follows_threshold() {
        let dealer_up = Card::new(10, Suit::Heart).unwrap();
        let mut bot = HitBelow::default();

        let low = hand(&[10, 6]);
        assert_eq!(bot.decide(&TurnView { player: &low, dealer_up }), Decision::Hit);

        let high = hand(&[10, 7]);
        assert_eq!(bot.decide(&TurnView { player: &high, dealer_up }), Decision::Stand);

        let mut cautious = HitBelow(12);
        assert_eq!(cautious.decide(&TurnView { player: &low, dealer_up }), Decision::Stand);
    }

    #[test]
    fn scripted_plays_in_order_then_stands() {
        let dealer_up = Card::new(2, Suit::Heart).unwrap();
        let player = hand(&[2, 3]);
        let view = TurnView { player: &player, dealer_up };
        let mut script = Scripted::new([Decision::Hit, Decision::Hit]);
        assert_eq!(script.decide(&view), Decision::Hit);
        assert_eq!(script.decide(&view), Decision::Hit);
        assert_eq!(script.decide(&view), Decision::Stand);
    }
}
