use rand::seq::SliceRandom;
use serde::{Deserialize, Deserializer, Serialize, de};
use std::fmt;
use thiserror::Error;

use super::constants::{BLACKJACK, INITIAL_HAND_SIZE};

/// Card suits, in wire order (the discriminant is the wire code).
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Heart = 0,
    Diamond = 1,
    Club = 2,
    Spade = 3,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Heart, Suit::Diamond, Suit::Club, Suit::Spade];

    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Heart),
            1 => Some(Self::Diamond),
            2 => Some(Self::Club),
            3 => Some(Self::Spade),
            _ => None,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Heart => "♥",
            Self::Diamond => "♦",
            Self::Club => "♣",
            Self::Spade => "♠",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for card and hand values.
pub type Value = u8;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum CardError {
    #[error("rank {0} is outside 1..=13")]
    InvalidRank(u16),
    #[error("suit {0} is outside 0..=3")]
    InvalidSuit(u8),
}

/// A playing card. Ranks run from 1 (ace) to 13 (king).
///
/// Cards can only be built through [`Card::new`] or [`Card::from_wire`],
/// so every `Card` in circulation has a valid rank.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card {
    rank: u8,
    suit: Suit,
}

impl Card {
    /// Card carried by outcome packets in place of a dealt card.
    pub const FILLER: Card = Card {
        rank: 1,
        suit: Suit::Heart,
    };

    pub fn new(rank: u8, suit: Suit) -> Result<Self, CardError> {
        if !(1..=13).contains(&rank) {
            return Err(CardError::InvalidRank(rank.into()));
        }
        Ok(Self { rank, suit })
    }

    /// Builds a card from its wire fields (`rank:u16`, `suit:u8`).
    pub fn from_wire(rank: u16, suit: u8) -> Result<Self, CardError> {
        let suit = Suit::from_code(suit).ok_or(CardError::InvalidSuit(suit))?;
        let rank = u8::try_from(rank).map_err(|_| CardError::InvalidRank(rank))?;
        Self::new(rank, suit).map_err(|_| CardError::InvalidRank(rank.into()))
    }

    #[must_use]
    pub const fn rank(&self) -> u8 {
        self.rank
    }

    #[must_use]
    pub const fn suit(&self) -> Suit {
        self.suit
    }

    /// Blackjack value of the card. Aces are always worth 11 in this game;
    /// there is no soft hand.
    #[must_use]
    pub const fn value(&self) -> Value {
        match self.rank {
            1 => 11,
            2..=10 => self.rank,
            _ => 10,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rank = match self.rank {
            1 => "A",
            11 => "J",
            12 => "Q",
            13 => "K",
            v => &v.to_string(),
        };
        write!(f, "{rank}{}", self.suit)
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawCard {
            rank: u8,
            suit: Suit,
        }

        let raw = RawCard::deserialize(deserializer)?;
        Card::new(raw.rank, raw.suit).map_err(de::Error::custom)
    }
}

/// A deck of cards. Cards are drawn from the top without replacement.
#[derive(Debug)]
pub struct Deck {
    // Top of the deck is the end of the vec.
    cards: Vec<Card>,
}

impl Deck {
    /// A full 52-card deck in random order.
    #[must_use]
    pub fn shuffled() -> Self {
        let mut deck = Self::default();
        deck.shuffle();
        deck
    }

    /// A deck that deals `order` front to back. Used to replay rounds
    /// deterministically.
    pub fn stacked(order: impl IntoIterator<Item = Card>) -> Self {
        let mut cards: Vec<Card> = order.into_iter().collect();
        cards.reverse();
        Self { cards }
    }

    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut rand::rng());
    }

    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl Default for Deck {
    fn default() -> Self {
        let mut cards = Vec::with_capacity(52);
        for suit in Suit::ALL {
            for rank in 1u8..14u8 {
                cards.push(Card { rank, suit });
            }
        }
        Self { cards }
    }
}

/// An ordered hand of cards.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Sum of card values with aces fixed at 11. Saturates at
    /// [`Value::MAX`] instead of overflowing.
    #[must_use]
    pub fn value(&self) -> Value {
        self.cards
            .iter()
            .fold(0, |total: Value, card| total.saturating_add(card.value()))
    }

    #[must_use]
    pub fn is_bust(&self) -> bool {
        self.value() > BLACKJACK
    }

    /// Whether the first two cards dealt total exactly 21.
    #[must_use]
    pub fn is_natural(&self) -> bool {
        self.cards.len() >= INITIAL_HAND_SIZE
            && self.cards[..INITIAL_HAND_SIZE]
                .iter()
                .map(Card::value)
                .sum::<Value>()
                == BLACKJACK
    }
}

impl FromIterator<Card> for Hand {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        Self {
            cards: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cards.is_empty() {
            return write!(f, "Empty hand (0)");
        }
        let cards = self
            .cards
            .iter()
            .map(Card::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "{cards} ({})", self.value())
    }
}

/// How a finished round went for the player.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Outcome {
    Win,
    Loss,
    Tie,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Win => "win",
            Self::Loss => "loss",
            Self::Tie => "tie",
        };
        write!(f, "{repr}")
    }
}

/// The result byte carried by every server card packet.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum RoundStatus {
    InProgress = 0,
    Tie = 1,
    Loss = 2,
    Win = 3,
}

impl RoundStatus {
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::InProgress),
            1 => Some(Self::Tie),
            2 => Some(Self::Loss),
            3 => Some(Self::Win),
            _ => None,
        }
    }

    /// The finished outcome, or `None` while the round is still running.
    #[must_use]
    pub const fn outcome(self) -> Option<Outcome> {
        match self {
            Self::InProgress => None,
            Self::Tie => Some(Outcome::Tie),
            Self::Loss => Some(Outcome::Loss),
            Self::Win => Some(Outcome::Win),
        }
    }
}

impl From<Outcome> for RoundStatus {
    fn from(value: Outcome) -> Self {
        match value {
            Outcome::Win => Self::Win,
            Outcome::Loss => Self::Loss,
            Outcome::Tie => Self::Tie,
        }
    }
}

/// A player's move.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Decision {
    Hit,
    Stand,
}

impl Decision {
    /// The exact 5-byte string sent on the wire.
    #[must_use]
    pub const fn wire(self) -> &'static str {
        match self {
            Self::Hit => "Hittt",
            Self::Stand => "Stand",
        }
    }

    #[must_use]
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "Hittt" => Some(Self::Hit),
            "Stand" => Some(Self::Stand),
            _ => None,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Hit => "hit",
            Self::Stand => "stand",
        };
        write!(f, "{repr}")
    }
}
