//! The dealer: accept loop, discovery broadcast, and one session per
//! connection.

use anyhow::Error;
use log::{debug, error, info, warn};
use std::{
    fmt,
    io::{self, Read, Write},
    net::{IpAddr, Ipv4Addr, Shutdown, SocketAddr, TcpListener, TcpStream},
    num::NonZeroU8,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use super::{
    discovery::{BroadcastConfig, Broadcaster},
    errors::SessionError,
    packets::{Offer, Request},
    utils::read_packet,
};
use crate::game::{
    entities::{Deck, Outcome},
    round::RoundEngine,
};

pub const DEFAULT_SERVER_NAME: &str = "Blackjack Dealer";

/// How long a session waits on a silent player before giving up.
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DealerConfig {
    pub server_name: String,
    pub bind_ip: IpAddr,
    pub read_timeout: Duration,
    /// `None` disables discovery; players then need the address up front.
    pub broadcast: Option<BroadcastConfig>,
}

impl Default for DealerConfig {
    fn default() -> Self {
        Self {
            server_name: DEFAULT_SERVER_NAME.to_string(),
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            read_timeout: READ_TIMEOUT,
            broadcast: Some(BroadcastConfig::default()),
        }
    }
}

/// Who a session is with, fixed once the request has been read.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionContext {
    pub id: usize,
    pub peer: SocketAddr,
    pub client_name: String,
    pub num_rounds: NonZeroU8,
}

impl fmt::Display for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {:?} ({})", self.id, self.client_name, self.peer)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Tally {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

impl Tally {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Tie => self.ties += 1,
        }
    }

    #[must_use]
    pub fn rounds(&self) -> u32 {
        self.wins + self.losses + self.ties
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} wins, {} losses, {} ties",
            self.wins, self.losses, self.ties
        )
    }
}

/// A completed session. Outcomes are from the player's side.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionSummary {
    pub context: SessionContext,
    pub tally: Tally,
}

/// Reads the player's request and plays every round they asked for, each
/// with a freshly shuffled deck.
pub fn run_session<S: Read + Write>(
    stream: &mut S,
    id: usize,
    peer: SocketAddr,
) -> Result<SessionSummary, SessionError> {
    run_session_with(stream, id, peer, Deck::shuffled)
}

/// Same as [`run_session`], with the deck for each round supplied by `deal`.
pub fn run_session_with<S, F>(
    stream: &mut S,
    id: usize,
    peer: SocketAddr,
    mut deal: F,
) -> Result<SessionSummary, SessionError>
where
    S: Read + Write,
    F: FnMut() -> Deck,
{
    let request = read_packet::<Request, _>(stream)
        .inspect_err(|error| warn!("session #{id} ({peer}): no valid request: {error}"))?;
    let context = SessionContext {
        id,
        peer,
        client_name: request.client_name,
        num_rounds: request.num_rounds,
    };
    info!("session {context} wants {} rounds", context.num_rounds);

    let total = context.num_rounds.get();
    let mut tally = Tally::default();
    for round in 1..=total {
        match RoundEngine::new(stream, deal()).play() {
            Ok(report) => {
                debug!("session #{id} round {round}/{total}: {report}");
                tally.record(report.outcome);
            }
            Err(error) => {
                error!("session {context} aborted in round {round}/{total}: {error} ({tally})");
                return Err(error);
            }
        }
    }

    info!("session {context} finished: {tally}");
    Ok(SessionSummary { context, tally })
}

/// A bound dealer that hasn't started accepting yet.
pub struct Server {
    config: DealerConfig,
    listener: TcpListener,
}

impl Server {
    /// Binds the game listener on an OS-chosen port.
    pub fn bind(config: DealerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(SocketAddr::new(config.bind_ip, 0))?;
        Ok(Self { config, listener })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Broadcasts offers and serves connections until `shutdown` is set.
    ///
    /// Every connection gets its own thread; a failing session never affects
    /// the others or the accept loop.
    pub fn run(self, shutdown: Arc<AtomicBool>) -> Result<(), Error> {
        let addr = self.local_addr()?;
        let _broadcaster = match self.config.broadcast {
            Some(broadcast) => Some(Broadcaster::spawn(
                broadcast,
                &Offer::new(addr.port(), self.config.server_name.clone()),
            )?),
            None => None,
        };

        self.listener.set_nonblocking(true)?;
        info!("dealer {:?} accepting on {addr}", self.config.server_name);

        let mut next_id = 0;
        while !shutdown.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    next_id += 1;
                    let id = next_id;
                    let read_timeout = self.config.read_timeout;
                    let spawned = thread::Builder::new()
                        .name(format!("session-{id}"))
                        .spawn(move || handle_connection(stream, id, peer, read_timeout));
                    if let Err(error) = spawned {
                        warn!("couldn't start session #{id} for {peer}: {error}");
                    }
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => {
                    warn!("accept failed: {error}");
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        info!("dealer {:?} shutting down", self.config.server_name);
        Ok(())
    }
}

fn handle_connection(mut stream: TcpStream, id: usize, peer: SocketAddr, read_timeout: Duration) {
    info!("session #{id}: connection from {peer}");
    match configure_stream(&stream, read_timeout) {
        Ok(()) => {
            // Failures are logged by the session itself.
            let _ = run_session(&mut stream, id, peer);
        }
        Err(error) => warn!("session #{id}: couldn't configure socket: {error}"),
    }
    if let Err(error) = stream.shutdown(Shutdown::Both) {
        debug!("session #{id}: shutdown: {error}");
    }
    info!("session #{id}: closed connection with {peer}");
}

fn configure_stream(stream: &TcpStream, read_timeout: Duration) -> io::Result<()> {
    // Accepted sockets may inherit the listener's non-blocking mode.
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(read_timeout))?;
    stream.set_write_timeout(Some(read_timeout))?;
    stream.set_nodelay(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        game::{
            entities::{Card, Decision, Suit},
            round::tests::ScriptedStream,
        },
        net::{
            errors::PacketError,
            packets::{ServerMessage, encode_decision, encode_request},
        },
    };

    fn peer() -> SocketAddr {
        "192.168.1.20:50000".parse().unwrap()
    }

    fn winning_deck() -> Deck {
        // Player 10+9 against dealer 10+7.
        Deck::stacked(
            [10, 9, 10, 7]
                .into_iter()
                .map(|rank| Card::new(rank, Suit::Club).unwrap()),
        )
    }

    fn input(rounds: u32, decisions: &[Decision]) -> Vec<u8> {
        let mut bytes = encode_request(rounds, "alice").unwrap().to_vec();
        for &decision in decisions {
            bytes.extend(encode_decision(decision));
        }
        bytes
    }

    #[test]
    fn plays_every_requested_round() {
        let mut stream = ScriptedStream::from_bytes(input(3, &[Decision::Stand; 3]));
        let summary = run_session_with(&mut stream, 7, peer(), winning_deck).unwrap();

        assert_eq!(summary.context.client_name, "alice");
        assert_eq!(summary.context.num_rounds.get(), 3);
        assert_eq!(summary.tally, Tally { wins: 3, losses: 0, ties: 0 });
        assert!(stream.fully_consumed());

        let outcomes = stream
            .sent()
            .into_iter()
            .filter(|message| matches!(message, ServerMessage::Outcome(_)))
            .count();
        assert_eq!(outcomes, 3);
    }

    #[test]
    fn bad_request_sends_nothing() {
        let mut bytes = input(1, &[]);
        bytes[0] = 0;
        let mut stream = ScriptedStream::from_bytes(bytes);
        let result = run_session_with(&mut stream, 1, peer(), winning_deck);
        assert!(matches!(
            result,
            Err(SessionError::Malformed(PacketError::BadCookie(_)))
        ));
        assert!(stream.output.is_empty());
    }

    #[test]
    fn player_leaving_mid_session_aborts() {
        let mut stream = ScriptedStream::from_bytes(input(2, &[Decision::Stand]));
        let result = run_session_with(&mut stream, 1, peer(), winning_deck);
        assert!(matches!(result, Err(SessionError::ConnectionClosed)));
    }

    #[test]
    fn tally_display() {
        let mut tally = Tally::default();
        tally.record(Outcome::Win);
        tally.record(Outcome::Tie);
        tally.record(Outcome::Win);
        assert_eq!(tally.rounds(), 3);
        assert_eq!(tally.to_string(), "2 wins, 0 losses, 1 ties");
    }

    #[test]
    fn context_display() {
        let context = SessionContext {
            id: 4,
            peer: peer(),
            client_name: "bob".to_string(),
            num_rounds: NonZeroU8::new(2).unwrap(),
        };
        assert_eq!(context.to_string(), "#4 \"bob\" (192.168.1.20:50000)");
    }
}
