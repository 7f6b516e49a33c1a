//! The player's side of the protocol.
//!
//! The client is blocking. Decisions come from a [`DecisionSource`] and
//! everything that happens at the table is reported to an [`EventSink`],
//! so the same code drives a terminal player, a bot, or a test.

use anyhow::{Error, bail};
use log::{debug, info, warn};
use std::{
    io::{Read, Write},
    net::{Shutdown, SocketAddr, TcpStream},
    thread,
    time::Duration,
};

use super::{
    errors::SessionError,
    packets::{Request, ServerMessage},
    utils::{read_packet, write_packet},
};
use crate::game::{
    constants::{DEALER_STAND_THRESHOLD, INITIAL_HAND_SIZE},
    decision::{DecisionSource, TurnView},
    entities::{Card, Decision, Hand, Outcome, RoundStatus},
    events::{EventSink, Owner, RoundEvent},
    round::RoundReport,
    stats::SessionStats,
};

/// Default timeout for reading from the dealer.
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for writing to the dealer.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// A connected player that has already sent its request.
pub struct Client {
    pub name: String,
    pub stream: TcpStream,
    num_rounds: u8,
}

/// How a session went from the player's side.
#[derive(Debug)]
pub struct SessionReport {
    pub stats: SessionStats,
    /// Why the session stopped early, if it did.
    pub failure: Option<SessionError>,
}

impl SessionReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

impl Client {
    /// Connects to a dealer and asks for `num_rounds` rounds.
    ///
    /// The round count is checked before anything is sent. Connecting is
    /// tried three times with increasing timeouts (100ms, 500ms, 1s).
    ///
    /// # Errors
    ///
    /// Returns an error if `num_rounds` is outside `1..=255`, if no
    /// connection could be made, or if the request couldn't be sent.
    pub fn connect(addr: &SocketAddr, name: &str, num_rounds: u32) -> Result<Self, Error> {
        let request = Request::new(num_rounds, name)?;
        let mut connect_timeouts = vec![
            Duration::from_secs(1),
            Duration::from_millis(500),
            Duration::from_millis(100),
        ];
        while let Some(connect_timeout) = connect_timeouts.pop() {
            match TcpStream::connect_timeout(addr, connect_timeout) {
                Ok(mut stream) => {
                    stream.set_read_timeout(Some(READ_TIMEOUT))?;
                    stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
                    stream.set_nodelay(true)?;
                    write_packet(&mut stream, &request)?;
                    info!("connected to {addr}, requested {num_rounds} rounds");
                    return Ok(Self {
                        name: name.to_string(),
                        stream,
                        num_rounds: request.num_rounds.get(),
                    });
                }
                Err(error) => {
                    debug!("connect to {addr} failed: {error}");
                    thread::sleep(connect_timeout);
                }
            }
        }
        bail!("couldn't connect to {addr} as {name}")
    }

    #[must_use]
    pub fn num_rounds(&self) -> u8 {
        self.num_rounds
    }

    pub fn play_round<D, E>(
        &mut self,
        decisions: &mut D,
        events: &mut E,
    ) -> Result<RoundReport, SessionError>
    where
        D: DecisionSource + ?Sized,
        E: EventSink + ?Sized,
    {
        play_round(&mut self.stream, decisions, events)
    }

    /// Plays every requested round, then closes the connection.
    ///
    /// A failed round ends the session; rounds played up to that point are
    /// still counted.
    pub fn play_session<D, E>(mut self, decisions: &mut D, events: &mut E) -> SessionReport
    where
        D: DecisionSource + ?Sized,
        E: EventSink + ?Sized,
    {
        let mut stats = SessionStats::default();
        let mut failure = None;
        for round in 1..=self.num_rounds {
            match self.play_round(decisions, events) {
                Ok(report) => {
                    debug!("round {round}/{}: {report}", self.num_rounds);
                    stats.record(&report);
                }
                Err(error) => {
                    warn!("round {round}/{} failed: {error}", self.num_rounds);
                    failure = Some(error);
                    break;
                }
            }
        }
        if let Err(error) = self.stream.shutdown(Shutdown::Both) {
            debug!("shutdown: {error}");
        }
        SessionReport { stats, failure }
    }
}

/// Plays one round as the player over any byte stream.
///
/// # Errors
///
/// Fails on I/O errors, malformed packets, or messages that arrive out of
/// order (an outcome while cards are expected, or the reverse).
pub fn play_round<S, D, E>(
    stream: &mut S,
    decisions: &mut D,
    events: &mut E,
) -> Result<RoundReport, SessionError>
where
    S: Read + Write,
    D: DecisionSource + ?Sized,
    E: EventSink + ?Sized,
{
    let mut player = Hand::new();
    let mut dealer = Hand::new();
    let mut hits = 0;
    let mut stands = 0;

    for _ in 0..2 {
        let card = expect_card(stream)?;
        player.push(card);
        emit_card(events, Owner::Player, card);
    }
    let dealer_up = expect_card(stream)?;
    dealer.push(dealer_up);
    emit_card(events, Owner::Dealer, dealer_up);

    // Two aces bust on the deal; the dealer follows up with the outcome.
    let outcome = if player.is_bust() {
        expect_outcome(stream)?
    } else {
        loop {
            events.emit(RoundEvent::TurnPrompt);
            let decision = decisions.decide(&TurnView {
                player: &player,
                dealer_up,
            });
            write_packet(stream, &decision)?;
            match decision {
                Decision::Hit => {
                    hits += 1;
                    let card = expect_card(stream)?;
                    player.push(card);
                    emit_card(events, Owner::Player, card);
                    if player.is_bust() {
                        break expect_outcome(stream)?;
                    }
                }
                Decision::Stand => {
                    stands += 1;
                    break dealer_turn(stream, &mut dealer, events)?;
                }
            }
        }
    };

    events.emit(RoundEvent::RoundResult {
        outcome,
        player_total: player.value(),
        dealer_total: dealer.value(),
    });
    Ok(RoundReport {
        outcome,
        player,
        dealer,
        hits,
        stands,
    })
}

/// Collects the hole card and every dealer draw until the outcome arrives.
fn dealer_turn<S: Read, E: EventSink + ?Sized>(
    stream: &mut S,
    dealer: &mut Hand,
    events: &mut E,
) -> Result<Outcome, SessionError> {
    loop {
        match read_packet::<ServerMessage, _>(stream)? {
            // After the hole card the dealer only draws below the threshold.
            ServerMessage::Card(card)
                if dealer.len() >= INITIAL_HAND_SIZE
                    && (dealer.is_bust() || dealer.value() >= DEALER_STAND_THRESHOLD) =>
            {
                return Err(SessionError::Protocol(format!(
                    "dealer drew {card} past {}",
                    dealer.value()
                )));
            }
            ServerMessage::Card(card) => {
                dealer.push(card);
                emit_card(events, Owner::Dealer, card);
            }
            ServerMessage::Outcome(outcome) => return Ok(outcome),
        }
    }
}

fn expect_card<S: Read>(stream: &mut S) -> Result<Card, SessionError> {
    match read_packet::<ServerMessage, _>(stream)? {
        ServerMessage::Card(card) => Ok(card),
        message => Err(SessionError::Protocol(format!(
            "expected a card, got {message}"
        ))),
    }
}

fn expect_outcome<S: Read>(stream: &mut S) -> Result<Outcome, SessionError> {
    match read_packet::<ServerMessage, _>(stream)? {
        ServerMessage::Outcome(outcome) => Ok(outcome),
        message => Err(SessionError::Protocol(format!(
            "expected the round outcome, got {message}"
        ))),
    }
}

fn emit_card<E: EventSink + ?Sized>(events: &mut E, owner: Owner, card: Card) {
    events.emit(RoundEvent::CardDealt {
        owner,
        card,
        status: RoundStatus::InProgress,
    });
}
