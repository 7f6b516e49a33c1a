//! The dealer's side of a single round.
//!
//! [`RoundEngine`] owns a deck for exactly one round and drives it through
//! its phases, talking to the player over any `Read + Write` stream:
//!
//! 1. Deal two cards to the player (both sent) and two to the dealer (only
//!    the first sent; the second is the hole card).
//! 2. Read decisions until the player stands or busts. A bust ends the round
//!    as a loss without the dealer playing.
//! 3. Reveal the hole card, then draw below 17, checking for a bust after
//!    every card.
//! 4. Compare totals.
//!
//! Every round ends with exactly one outcome message. A player dealt two
//! aces (22) loses straight after the deal.

use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    io::{Read, Write},
};

use super::{
    constants::DEALER_STAND_THRESHOLD,
    entities::{Card, Decision, Deck, Hand, Outcome, Value},
};
use crate::net::{
    errors::SessionError,
    packets::ServerMessage,
    utils::{read_packet, write_packet},
};

/// Everything worth knowing about a finished round.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoundReport {
    pub outcome: Outcome,
    pub player: Hand,
    /// On the dealer side this holds the hole card even if it was never
    /// revealed. On the player side it holds only what was shown.
    pub dealer: Hand,
    pub hits: u32,
    pub stands: u32,
}

impl RoundReport {
    #[must_use]
    pub fn player_total(&self) -> Value {
        self.player.value()
    }

    #[must_use]
    pub fn dealer_total(&self) -> Value {
        self.dealer.value()
    }
}

impl fmt::Display for RoundReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: player {} vs dealer {}",
            self.outcome, self.player, self.dealer
        )
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    DealInitial,
    PlayerTurn,
    DealerReveal,
    DealerDraw,
    Resolve,
    Over(Outcome),
}

pub struct RoundEngine<'a, S> {
    stream: &'a mut S,
    deck: Deck,
    player: Hand,
    dealer: Hand,
    phase: Phase,
    hits: u32,
    stands: u32,
}

impl<'a, S: Read + Write> RoundEngine<'a, S> {
    pub fn new(stream: &'a mut S, deck: Deck) -> Self {
        Self {
            stream,
            deck,
            player: Hand::new(),
            dealer: Hand::new(),
            phase: Phase::DealInitial,
            hits: 0,
            stands: 0,
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Plays the round to completion.
    ///
    /// # Errors
    ///
    /// Any I/O failure, malformed packet, or unknown decision aborts the
    /// round. Win, loss and tie are never errors.
    pub fn play(mut self) -> Result<RoundReport, SessionError> {
        loop {
            self.phase = match self.phase {
                Phase::DealInitial => self.deal_initial()?,
                Phase::PlayerTurn => self.player_turn()?,
                Phase::DealerReveal => self.dealer_reveal()?,
                Phase::DealerDraw => self.dealer_draw()?,
                Phase::Resolve => Phase::Over(self.resolve()),
                Phase::Over(outcome) => {
                    self.send(ServerMessage::Outcome(outcome))?;
                    debug!("round over: {outcome}");
                    return Ok(RoundReport {
                        outcome,
                        player: self.player,
                        dealer: self.dealer,
                        hits: self.hits,
                        stands: self.stands,
                    });
                }
            };
        }
    }

    fn deal_initial(&mut self) -> Result<Phase, SessionError> {
        for _ in 0..2 {
            let card = self.draw()?;
            self.player.push(card);
            self.send(ServerMessage::Card(card))?;
        }
        let up = self.draw()?;
        self.dealer.push(up);
        self.send(ServerMessage::Card(up))?;
        let hole = self.draw()?;
        self.dealer.push(hole);
        debug!("player {} against dealer {up} (hole {hole})", self.player);

        if self.player.is_bust() {
            debug!("player busts on the deal with {}", self.player.value());
            return Ok(Phase::Over(Outcome::Loss));
        }
        Ok(Phase::PlayerTurn)
    }

    fn player_turn(&mut self) -> Result<Phase, SessionError> {
        match read_packet::<Decision, _>(&mut *self.stream)? {
            Decision::Hit => {
                self.hits += 1;
                let card = self.draw()?;
                self.player.push(card);
                self.send(ServerMessage::Card(card))?;
                debug!("player hits {card}: {}", self.player);
                if self.player.is_bust() {
                    return Ok(Phase::Over(Outcome::Loss));
                }
                Ok(Phase::PlayerTurn)
            }
            Decision::Stand => {
                self.stands += 1;
                debug!("player stands on {}", self.player.value());
                Ok(Phase::DealerReveal)
            }
        }
    }

    fn dealer_reveal(&mut self) -> Result<Phase, SessionError> {
        // The deal always leaves exactly two dealer cards behind.
        let hole = self.dealer.cards()[1];
        self.send(ServerMessage::Card(hole))?;
        debug!("dealer reveals {hole}: {}", self.dealer);
        if self.dealer.is_bust() {
            return Ok(Phase::Over(Outcome::Win));
        }
        Ok(Phase::DealerDraw)
    }

    fn dealer_draw(&mut self) -> Result<Phase, SessionError> {
        if self.dealer.value() >= DEALER_STAND_THRESHOLD {
            return Ok(Phase::Resolve);
        }
        let card = self.draw()?;
        self.dealer.push(card);
        self.send(ServerMessage::Card(card))?;
        debug!("dealer draws {card}: {}", self.dealer);
        if self.dealer.is_bust() {
            return Ok(Phase::Over(Outcome::Win));
        }
        Ok(Phase::DealerDraw)
    }

    fn resolve(&self) -> Outcome {
        let player = self.player.value();
        let dealer = self.dealer.value();
        match player.cmp(&dealer) {
            std::cmp::Ordering::Greater => Outcome::Win,
            std::cmp::Ordering::Less => Outcome::Loss,
            std::cmp::Ordering::Equal => Outcome::Tie,
        }
    }

    fn draw(&mut self) -> Result<Card, SessionError> {
        self.deck.draw().ok_or(SessionError::DeckExhausted)
    }

    fn send(&mut self, message: ServerMessage) -> Result<(), SessionError> {
        write_packet(&mut *self.stream, &message)
    }
}

/// Plays one round with a freshly shuffled deck.
pub fn play_round<S: Read + Write>(stream: &mut S) -> Result<RoundReport, SessionError> {
    RoundEngine::new(stream, Deck::shuffled()).play()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::{self, Cursor, Read, Write};

    use super::*;
    use crate::{
        game::entities::Suit,
        net::{
            errors::PacketError,
            packets::{SERVER_CARD_LEN, WirePacket, encode_decision},
        },
    };

    /// Replays canned client bytes and records everything the dealer sends.
    pub(crate) struct ScriptedStream {
        input: Cursor<Vec<u8>>,
        pub(crate) output: Vec<u8>,
    }

    impl ScriptedStream {
        pub(crate) fn new(decisions: &[Decision]) -> Self {
            let input = decisions.iter().flat_map(|&d| encode_decision(d)).collect();
            Self::from_bytes(input)
        }

        pub(crate) fn from_bytes(input: Vec<u8>) -> Self {
            Self {
                input: Cursor::new(input),
                output: Vec::new(),
            }
        }

        pub(crate) fn sent(&self) -> Vec<ServerMessage> {
            self.output
                .chunks(SERVER_CARD_LEN)
                .map(|chunk| ServerMessage::decode(chunk).unwrap())
                .collect()
        }

        pub(crate) fn fully_consumed(&self) -> bool {
            self.input.position() as usize == self.input.get_ref().len()
        }
    }

    impl Read for ScriptedStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for ScriptedStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn card(rank: u8, suit: Suit) -> Card {
        Card::new(rank, suit).unwrap()
    }

    fn cards(ranks: &[u8]) -> Vec<Card> {
        ranks
            .iter()
            .enumerate()
            .map(|(i, &rank)| card(rank, Suit::ALL[i % 4]))
            .collect()
    }

    fn dealt(ranks: &[u8]) -> Vec<ServerMessage> {
        cards(ranks).into_iter().map(ServerMessage::Card).collect()
    }

    fn play(deck: &[u8], decisions: &[Decision]) -> (Result<RoundReport, SessionError>, ScriptedStream) {
        let mut stream = ScriptedStream::new(decisions);
        let result = RoundEngine::new(&mut stream, Deck::stacked(cards(deck))).play();
        (result, stream)
    }

    #[test]
    fn dealer_busts_on_third_card() {
        // Player 10+7 stands; dealer 6+10 draws a 6 for 22. The trailing 5 is never drawn.
        let (result, stream) = play(&[10, 7, 6, 10, 6, 5], &[Decision::Stand]);
        let report = result.unwrap();
        assert_eq!(report.outcome, Outcome::Win);
        assert_eq!(report.dealer.len(), 3);
        assert_eq!(report.dealer_total(), 22);
        assert_eq!(report.stands, 1);

        let mut expected = dealt(&[10, 7, 6, 10, 6]);
        expected.push(ServerMessage::Outcome(Outcome::Win));
        assert_eq!(stream.sent(), expected);
    }

    #[test]
    fn player_bust_ends_round_without_dealer_play() {
        // Player A+9 hits another ace for 31.
        let (result, stream) = play(&[1, 9, 10, 7, 1, 5], &[Decision::Hit]);
        let report = result.unwrap();
        assert_eq!(report.outcome, Outcome::Loss);
        assert_eq!(report.player_total(), 31);
        assert_eq!(report.dealer.len(), 2);
        assert_eq!(report.hits, 1);

        let sent = stream.sent();
        assert_eq!(sent.len(), 5);
        assert_eq!(sent[3], ServerMessage::Card(cards(&[1, 9, 10, 7, 1])[4]));
        assert_eq!(sent[4], ServerMessage::Outcome(Outcome::Loss));
    }

    #[test]
    fn two_aces_on_the_deal_lose_immediately() {
        let (result, stream) = play(&[1, 1, 5, 5], &[]);
        let report = result.unwrap();
        assert_eq!(report.outcome, Outcome::Loss);
        assert_eq!(report.player_total(), 22);

        let mut expected = dealt(&[1, 1, 5]);
        expected.push(ServerMessage::Outcome(Outcome::Loss));
        assert_eq!(stream.sent(), expected);
    }

    #[test]
    fn dealer_two_aces_bust_on_reveal() {
        let (result, stream) = play(&[10, 7, 1, 1, 5], &[Decision::Stand]);
        assert_eq!(result.unwrap().outcome, Outcome::Win);

        let mut expected = dealt(&[10, 7, 1, 1]);
        expected.push(ServerMessage::Outcome(Outcome::Win));
        assert_eq!(stream.sent(), expected);
    }

    #[test]
    fn equal_totals_tie() {
        // Player 10+9; dealer 6+7 draws a 6 and stands on 19.
        let (result, stream) = play(&[10, 9, 6, 7, 6, 5], &[Decision::Stand]);
        let report = result.unwrap();
        assert_eq!(report.outcome, Outcome::Tie);
        assert_eq!(report.dealer_total(), 19);
        assert_eq!(stream.sent().last(), Some(&ServerMessage::Outcome(Outcome::Tie)));
    }

    #[test]
    fn higher_dealer_total_loses() {
        let (result, _) = play(&[10, 6, 10, 8], &[Decision::Stand]);
        let report = result.unwrap();
        assert_eq!(report.outcome, Outcome::Loss);
        assert_eq!(report.dealer.len(), 2, "dealer stands on 18 without drawing");
    }

    #[test]
    fn dealer_stands_on_exactly_17() {
        let (result, stream) = play(&[10, 10, 10, 7, 2], &[Decision::Stand]);
        assert_eq!(result.unwrap().outcome, Outcome::Win);
        assert_eq!(stream.sent().len(), 5);
    }

    #[test]
    fn several_hits_then_stand() {
        let (result, stream) = play(
            &[2, 3, 10, 7, 2, 4, 5],
            &[Decision::Hit, Decision::Hit, Decision::Stand],
        );
        let report = result.unwrap();
        assert_eq!(report.player_total(), 11);
        assert_eq!(report.hits, 2);
        assert_eq!(report.stands, 1);
        assert_eq!(report.outcome, Outcome::Loss);
        assert!(stream.fully_consumed());
    }

    #[test]
    fn unknown_decision_aborts() {
        let mut input = encode_decision(Decision::Hit);
        input[5..].copy_from_slice(b"Fold\0");
        let mut stream = ScriptedStream::from_bytes(input.to_vec());
        let result = RoundEngine::new(&mut stream, Deck::stacked(cards(&[2, 3, 4, 5]))).play();
        assert!(matches!(result, Err(SessionError::InvalidDecision(ref d)) if d == "Fold"));
    }

    #[test]
    fn corrupt_decision_aborts() {
        let mut input = encode_decision(Decision::Hit);
        input[0] = 0;
        let mut stream = ScriptedStream::from_bytes(input.to_vec());
        let result = RoundEngine::new(&mut stream, Deck::stacked(cards(&[2, 3, 4, 5]))).play();
        assert!(matches!(
            result,
            Err(SessionError::Malformed(PacketError::BadCookie(_)))
        ));
    }

    #[test]
    fn closed_connection_aborts() {
        let (result, stream) = play(&[10, 7, 5, 5], &[]);
        assert!(matches!(result, Err(SessionError::ConnectionClosed)));
        assert_eq!(stream.sent().len(), 3);
    }

    #[test]
    fn short_deck_is_reported() {
        let (result, _) = play(&[10, 7, 5], &[]);
        assert!(matches!(result, Err(SessionError::DeckExhausted)));
    }

    #[test]
    fn fresh_engine_starts_with_the_deal() {
        let mut stream = ScriptedStream::new(&[]);
        let engine = RoundEngine::new(&mut stream, Deck::default());
        assert_eq!(engine.phase(), Phase::DealInitial);
    }
}
