//! # LAN Blackjack
//!
//! A dealer and player for one-on-one Blackjack over a local network.
//!
//! Dealers announce themselves with UDP broadcasts. A player picks one,
//! opens a TCP connection, asks for a number of rounds, and plays them out
//! one hit-or-stand decision at a time. The dealer is authoritative: it
//! shuffles, deals, plays its own hand by the stand-on-17 rule, and sends
//! the outcome.
//!
//! ## Core Modules
//!
//! - [`game`]: cards, hands, the round state machine, and statistics
//! - [`net`]: packet codec, stream framing, discovery, server, and client
//!
//! ## Example
//!
//! ```
//! use lan_blackjack::{Card, Hand, Suit};
//!
//! let hand: Hand = [Card::new(1, Suit::Spade).unwrap(), Card::new(13, Suit::Heart).unwrap()]
//!     .into_iter()
//!     .collect();
//! assert_eq!(hand.value(), 21);
//! assert!(hand.is_natural());
//! ```

/// Networking components for dealers and players.
pub mod net;
pub use net::{
    client::{Client, SessionReport},
    discovery::{self, ScanConfig, ServerInfo, ServerMap},
    errors::{DiscoveryError, PacketError, SessionError},
    packets,
    server::{self, DealerConfig, Server},
    utils,
};

/// Game rules, round engine and statistics.
pub mod game;
pub use game::{
    constants,
    decision::{DecisionSource, HitBelow, TurnView},
    entities::{Card, Decision, Deck, Hand, Outcome, RoundStatus, Suit, Value},
    events::{EventSink, IgnoreEvents, Owner, RoundEvent},
    round::{RoundEngine, RoundReport},
    stats::SessionStats,
};
