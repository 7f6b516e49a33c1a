//! Networking for dealers and players.
//!
//! Packets have a fixed binary layout (see [`packets`]) and travel over UDP
//! for discovery and over TCP for play. The dealer runs one blocking thread
//! per connection.

/// Blocking TCP client for the player side.
pub mod client;

/// UDP offer broadcasting and scanning.
pub mod discovery;

/// Codec, framing and session error types.
pub mod errors;

/// Fixed-layout packet encoding and decoding.
pub mod packets;

/// Dealer accept loop and per-connection sessions.
pub mod server;

/// Exact-length reads and single-chunk writes over byte streams.
pub mod utils;
