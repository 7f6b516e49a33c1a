//! Network error types for packet decoding and session I/O.

use std::io;
use thiserror::Error;

/// Errors from encoding or decoding a single packet.
///
/// Decoding never panics on bad input; every rejection is one of these.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum PacketError {
    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("bad magic cookie {0:#010x}")]
    BadCookie(u32),

    #[error("expected packet type {expected:#04x}, got {actual:#04x}")]
    WrongType { expected: u8, actual: u8 },

    #[error("{field} value {value} out of range")]
    OutOfRange { field: &'static str, value: u32 },

    /// A well-formed decision packet carrying neither "Hittt" nor "Stand".
    #[error("unrecognized decision {0:?}")]
    InvalidDecision(String),

    /// Rejected while building a packet, before any bytes were produced.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Errors that end a TCP session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed packet: {0}")]
    Malformed(PacketError),

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("timed out waiting for peer")]
    Timeout,

    #[error("invalid decision {0:?}")]
    InvalidDecision(String),

    /// The peer sent a valid packet at the wrong point of the round.
    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("deck exhausted")]
    DeckExhausted,

    #[error("io error: {0}")]
    Io(io::Error),
}

impl From<PacketError> for SessionError {
    fn from(value: PacketError) -> Self {
        match value {
            PacketError::InvalidDecision(decision) => Self::InvalidDecision(decision),
            error => Self::Malformed(error),
        }
    }
}

impl From<io::Error> for SessionError {
    fn from(value: io::Error) -> Self {
        match value.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => Self::ConnectionClosed,
            // Socket read timeouts surface as either kind depending on platform.
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Self::Timeout,
            _ => Self::Io(value),
        }
    }
}

/// Errors from UDP discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
