//! Round events for presentation layers.
//!
//! The player side of a session reports what happens at the table as a
//! stream of [`RoundEvent`]s. A terminal front-end prints them, a web bridge
//! serializes and forwards them, and a betting layer only watches for
//! [`RoundEvent::RoundResult`].

use serde::{Deserialize, Serialize};
use std::fmt;

use super::entities::{Card, Outcome, RoundStatus, Value};

/// Whose hand a card was dealt to.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Owner {
    Player,
    Dealer,
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Player => "player",
            Self::Dealer => "dealer",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum RoundEvent {
    CardDealt {
        owner: Owner,
        card: Card,
        status: RoundStatus,
    },
    /// The player has to decide between hit and stand.
    TurnPrompt,
    RoundResult {
        outcome: Outcome,
        player_total: Value,
        dealer_total: Value,
    },
}

impl fmt::Display for RoundEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CardDealt { owner, card, .. } => write!(f, "{owner} receives {card}"),
            Self::TurnPrompt => write!(f, "player to act"),
            Self::RoundResult {
                outcome,
                player_total,
                dealer_total,
            } => write!(f, "{outcome} ({player_total} vs {dealer_total})"),
        }
    }
}

/// Receiver of round events.
pub trait EventSink {
    fn emit(&mut self, event: RoundEvent);
}

/// Records every event, mostly for tests and replays.
impl EventSink for Vec<RoundEvent> {
    fn emit(&mut self, event: RoundEvent) {
        self.push(event);
    }
}

/// Drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct IgnoreEvents;

impl EventSink for IgnoreEvents {
    fn emit(&mut self, _event: RoundEvent) {}
}
