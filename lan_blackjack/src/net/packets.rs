//! Fixed-layout packets of the blackjack protocol.
//!
//! Every packet starts with the 4-byte [`MAGIC_COOKIE`] and a 1-byte type
//! code; all integers are big-endian.
//!
//! | Packet          | Layout                                                  | Bytes |
//! |-----------------|---------------------------------------------------------|-------|
//! | Offer           | cookie, `0x02`, tcp port `u16`, name `[u8; 32]`         | 39    |
//! | Request         | cookie, `0x03`, rounds `u8`, name `[u8; 32]`            | 38    |
//! | Client decision | cookie, `0x04`, decision `[u8; 5]`                      | 10    |
//! | Server card     | cookie, `0x04`, result `u8`, rank `u16`, suit `u8`      | 9     |
//!
//! Names are zero-padded and truncated to 32 bytes. A server card whose
//! result byte is not "in progress" announces the end of the round; its card
//! fields hold [`Card::FILLER`] and carry no meaning. In code that pair is
//! modelled as [`ServerMessage::Outcome`] so no caller ever sees the filler.

use std::{fmt, num::NonZeroU8};

use crate::game::entities::{Card, CardError, Decision, Outcome, RoundStatus};

use super::errors::PacketError;

pub const MAGIC_COOKIE: u32 = 0xabcd_dcba;

pub const TYPE_OFFER: u8 = 0x02;
pub const TYPE_REQUEST: u8 = 0x03;
pub const TYPE_PAYLOAD: u8 = 0x04;

pub const NAME_LEN: usize = 32;
pub const DECISION_LEN: usize = 5;

const HEADER_LEN: usize = 5;

pub const OFFER_LEN: usize = HEADER_LEN + 2 + NAME_LEN;
pub const REQUEST_LEN: usize = HEADER_LEN + 1 + NAME_LEN;
pub const DECISION_PACKET_LEN: usize = HEADER_LEN + DECISION_LEN;
pub const SERVER_CARD_LEN: usize = HEADER_LEN + 1 + 2 + 1;

/// A packet with a fixed wire size.
pub trait WirePacket: Sized {
    const LEN: usize;

    fn encode(&self) -> Vec<u8>;

    fn decode(bytes: &[u8]) -> Result<Self, PacketError>;
}

/// UDP announcement of a dealer's TCP port and name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Offer {
    pub tcp_port: u16,
    pub server_name: String,
}

impl Offer {
    pub fn new(tcp_port: u16, server_name: impl Into<String>) -> Self {
        Self {
            tcp_port,
            server_name: server_name.into(),
        }
    }
}

impl WirePacket for Offer {
    const LEN: usize = OFFER_LEN;

    fn encode(&self) -> Vec<u8> {
        encode_offer(self.tcp_port, &self.server_name).to_vec()
    }

    fn decode(bytes: &[u8]) -> Result<Self, PacketError> {
        decode_offer(bytes)
    }
}

/// A client's opening message: how many rounds to play and who's asking.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Request {
    pub num_rounds: NonZeroU8,
    pub client_name: String,
}

impl Request {
    /// Validates the round count before anything touches the wire.
    pub fn new(num_rounds: u32, client_name: impl Into<String>) -> Result<Self, PacketError> {
        Ok(Self {
            num_rounds: checked_rounds(num_rounds)?,
            client_name: client_name.into(),
        })
    }
}

impl WirePacket for Request {
    const LEN: usize = REQUEST_LEN;

    fn encode(&self) -> Vec<u8> {
        request_bytes(self.num_rounds, &self.client_name).to_vec()
    }

    fn decode(bytes: &[u8]) -> Result<Self, PacketError> {
        decode_request(bytes)
    }
}

impl WirePacket for Decision {
    const LEN: usize = DECISION_PACKET_LEN;

    fn encode(&self) -> Vec<u8> {
        encode_decision(*self).to_vec()
    }

    fn decode(bytes: &[u8]) -> Result<Self, PacketError> {
        decode_decision(bytes)
    }
}

/// Everything the dealer sends during a round.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ServerMessage {
    /// A card dealt face up, to either hand.
    Card(Card),
    /// The round is over.
    Outcome(Outcome),
}

impl ServerMessage {
    #[must_use]
    pub fn status(&self) -> RoundStatus {
        match self {
            Self::Card(_) => RoundStatus::InProgress,
            Self::Outcome(outcome) => (*outcome).into(),
        }
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Card(card) => write!(f, "card {card}"),
            Self::Outcome(outcome) => write!(f, "outcome {outcome}"),
        }
    }
}

impl WirePacket for ServerMessage {
    const LEN: usize = SERVER_CARD_LEN;

    fn encode(&self) -> Vec<u8> {
        let card = match self {
            Self::Card(card) => *card,
            Self::Outcome(_) => Card::FILLER,
        };
        server_card_bytes(self.status(), card).to_vec()
    }

    fn decode(bytes: &[u8]) -> Result<Self, PacketError> {
        let (status, card) = decode_server_card(bytes)?;
        Ok(match status.outcome() {
            None => Self::Card(card),
            Some(outcome) => Self::Outcome(outcome),
        })
    }
}

pub fn encode_offer(tcp_port: u16, server_name: &str) -> [u8; OFFER_LEN] {
    let mut buf = [0u8; OFFER_LEN];
    buf[..HEADER_LEN].copy_from_slice(&header(TYPE_OFFER));
    buf[HEADER_LEN..HEADER_LEN + 2].copy_from_slice(&tcp_port.to_be_bytes());
    buf[HEADER_LEN + 2..].copy_from_slice(&pad::<NAME_LEN>(server_name));
    buf
}

pub fn decode_offer(bytes: &[u8]) -> Result<Offer, PacketError> {
    check_header(bytes, OFFER_LEN, TYPE_OFFER)?;
    Ok(Offer {
        tcp_port: u16::from_be_bytes([bytes[HEADER_LEN], bytes[HEADER_LEN + 1]]),
        server_name: unpad(&bytes[HEADER_LEN + 2..]),
    })
}

/// Fails with [`PacketError::InvalidArgument`] unless `num_rounds` is in `1..=255`.
pub fn encode_request(num_rounds: u32, client_name: &str) -> Result<[u8; REQUEST_LEN], PacketError> {
    Ok(request_bytes(checked_rounds(num_rounds)?, client_name))
}

pub fn decode_request(bytes: &[u8]) -> Result<Request, PacketError> {
    check_header(bytes, REQUEST_LEN, TYPE_REQUEST)?;
    let rounds = bytes[HEADER_LEN];
    let num_rounds = NonZeroU8::new(rounds).ok_or(PacketError::OutOfRange {
        field: "num_rounds",
        value: rounds.into(),
    })?;
    Ok(Request {
        num_rounds,
        client_name: unpad(&bytes[HEADER_LEN + 1..]),
    })
}

pub fn encode_decision(decision: Decision) -> [u8; DECISION_PACKET_LEN] {
    let mut buf = [0u8; DECISION_PACKET_LEN];
    buf[..HEADER_LEN].copy_from_slice(&header(TYPE_PAYLOAD));
    buf[HEADER_LEN..].copy_from_slice(&pad::<DECISION_LEN>(decision.wire()));
    buf
}

/// Decodes a client decision. A correctly framed packet with an unknown
/// decision string fails with [`PacketError::InvalidDecision`].
pub fn decode_decision(bytes: &[u8]) -> Result<Decision, PacketError> {
    check_header(bytes, DECISION_PACKET_LEN, TYPE_PAYLOAD)?;
    let decision = unpad(&bytes[HEADER_LEN..]);
    Decision::from_wire(&decision).ok_or(PacketError::InvalidDecision(decision))
}

/// Range-checks raw server card fields and encodes them.
pub fn encode_server_card(
    result: u8,
    rank: u16,
    suit: u8,
) -> Result<[u8; SERVER_CARD_LEN], PacketError> {
    let status = RoundStatus::from_code(result)
        .ok_or_else(|| PacketError::InvalidArgument(format!("result {result} is outside 0..=3")))?;
    let card = Card::from_wire(rank, suit)
        .map_err(|error| PacketError::InvalidArgument(error.to_string()))?;
    Ok(server_card_bytes(status, card))
}

pub fn decode_server_card(bytes: &[u8]) -> Result<(RoundStatus, Card), PacketError> {
    check_header(bytes, SERVER_CARD_LEN, TYPE_PAYLOAD)?;
    let result = bytes[HEADER_LEN];
    let status = RoundStatus::from_code(result).ok_or(PacketError::OutOfRange {
        field: "result",
        value: result.into(),
    })?;
    let rank = u16::from_be_bytes([bytes[HEADER_LEN + 1], bytes[HEADER_LEN + 2]]);
    let card = Card::from_wire(rank, bytes[HEADER_LEN + 3]).map_err(|error| match error {
        CardError::InvalidRank(rank) => PacketError::OutOfRange {
            field: "rank",
            value: rank.into(),
        },
        CardError::InvalidSuit(suit) => PacketError::OutOfRange {
            field: "suit",
            value: suit.into(),
        },
    })?;
    Ok((status, card))
}

fn checked_rounds(num_rounds: u32) -> Result<NonZeroU8, PacketError> {
    u8::try_from(num_rounds)
        .ok()
        .and_then(NonZeroU8::new)
        .ok_or_else(|| {
            PacketError::InvalidArgument(format!(
                "num_rounds must be between 1 and 255, got {num_rounds}"
            ))
        })
}

fn request_bytes(num_rounds: NonZeroU8, client_name: &str) -> [u8; REQUEST_LEN] {
    let mut buf = [0u8; REQUEST_LEN];
    buf[..HEADER_LEN].copy_from_slice(&header(TYPE_REQUEST));
    buf[HEADER_LEN] = num_rounds.get();
    buf[HEADER_LEN + 1..].copy_from_slice(&pad::<NAME_LEN>(client_name));
    buf
}

fn server_card_bytes(status: RoundStatus, card: Card) -> [u8; SERVER_CARD_LEN] {
    let mut buf = [0u8; SERVER_CARD_LEN];
    buf[..HEADER_LEN].copy_from_slice(&header(TYPE_PAYLOAD));
    buf[HEADER_LEN] = status.code();
    buf[HEADER_LEN + 1..HEADER_LEN + 3].copy_from_slice(&u16::from(card.rank()).to_be_bytes());
    buf[HEADER_LEN + 3] = card.suit().code();
    buf
}

fn header(kind: u8) -> [u8; HEADER_LEN] {
    let mut buf = [0u8; HEADER_LEN];
    buf[..4].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
    buf[4] = kind;
    buf
}

fn check_header(bytes: &[u8], len: usize, kind: u8) -> Result<(), PacketError> {
    if bytes.len() != len {
        return Err(PacketError::Length {
            expected: len,
            actual: bytes.len(),
        });
    }
    let cookie = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if cookie != MAGIC_COOKIE {
        return Err(PacketError::BadCookie(cookie));
    }
    if bytes[4] != kind {
        return Err(PacketError::WrongType {
            expected: kind,
            actual: bytes[4],
        });
    }
    Ok(())
}

/// Truncates or zero-pads `s` to exactly `N` bytes.
fn pad<const N: usize>(s: &str) -> [u8; N] {
    let mut buf = [0u8; N];
    let bytes = s.as_bytes();
    let len = bytes.len().min(N);
    buf[..len].copy_from_slice(&bytes[..len]);
    buf
}

/// Strips trailing zero padding. Malformed UTF-8 is replaced, not rejected.
fn unpad(bytes: &[u8]) -> String {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
