//! End-to-end sessions between a live dealer and players over loopback TCP.

use lan_blackjack::{
    Client, DealerConfig, HitBelow, IgnoreEvents, Outcome, RoundEvent, Server, SessionError,
    server::run_session,
};
use std::{
    io::Write,
    net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

struct RunningServer {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl RunningServer {
    fn start() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let config = DealerConfig {
            server_name: "Integration".to_string(),
            bind_ip: Ipv4Addr::LOCALHOST.into(),
            read_timeout: Duration::from_secs(5),
            broadcast: None,
        };
        let server = Server::bind(config).unwrap();
        let addr = server.local_addr().unwrap();
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();
        let handle = thread::spawn(move || server.run(flag).unwrap());
        Self {
            addr,
            shutdown,
            handle,
        }
    }

    fn stop(self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.handle.join().unwrap();
    }
}

#[test]
fn client_plays_every_requested_round() {
    let server = RunningServer::start();

    let client = Client::connect(&server.addr, "bot", 5).unwrap();
    assert_eq!(client.num_rounds(), 5);
    let mut events: Vec<RoundEvent> = Vec::new();
    let report = client.play_session(&mut HitBelow::default(), &mut events);

    assert!(report.is_complete(), "session failed: {:?}", report.failure);
    assert_eq!(report.stats.rounds_played(), 5);
    let results = events
        .iter()
        .filter(|event| matches!(event, RoundEvent::RoundResult { .. }))
        .count();
    assert_eq!(results, 5);

    server.stop();
}

#[test]
fn concurrent_players_are_independent() {
    let server = RunningServer::start();
    let addr = server.addr;

    let players: Vec<_> = (0..4)
        .map(|i| {
            thread::spawn(move || {
                let client = Client::connect(&addr, &format!("bot{i}"), 3).unwrap();
                client.play_session(&mut HitBelow(12 + i), &mut IgnoreEvents)
            })
        })
        .collect();

    for player in players {
        let report = player.join().unwrap();
        assert!(report.is_complete());
        assert_eq!(report.stats.rounds_played(), 3);
    }

    server.stop();
}

#[test]
fn misbehaving_peer_does_not_disturb_others() {
    let server = RunningServer::start();

    let mut rogue = TcpStream::connect(server.addr).unwrap();
    rogue.write_all(b"GET / HTTP/1.1\r\nHost: example\r\n\r\n").unwrap();

    let client = Client::connect(&server.addr, "bot", 2).unwrap();
    let report = client.play_session(&mut HitBelow::default(), &mut IgnoreEvents);
    assert!(report.is_complete());
    assert_eq!(report.stats.rounds_played(), 2);

    server.stop();
}

#[test]
fn invalid_round_counts_fail_before_connecting() {
    // Nothing listens here; the error must come from validation, not the network.
    let addr: SocketAddr = "127.0.0.1:9".parse().unwrap();
    for rounds in [0, 256, 300] {
        let error = Client::connect(&addr, "bot", rounds).err().unwrap();
        assert!(error.to_string().contains("num_rounds"), "{error}");
    }
}

#[test]
fn dealer_and_player_tallies_agree() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let dealer = thread::spawn(move || {
        let (mut stream, peer) = listener.accept().unwrap();
        run_session(&mut stream, 1, peer)
    });

    let client = Client::connect(&addr, "bot", 20).unwrap();
    let report = client.play_session(&mut HitBelow(15), &mut IgnoreEvents);
    let summary = dealer.join().unwrap().unwrap();

    assert!(report.is_complete());
    assert_eq!(summary.context.client_name, "bot");
    assert_eq!(summary.tally.wins, report.stats.wins);
    assert_eq!(summary.tally.losses, report.stats.losses);
    assert_eq!(summary.tally.ties, report.stats.ties);
    assert_eq!(summary.tally.rounds(), 20);
}

#[test]
fn player_disconnect_is_reported_to_the_dealer() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let dealer = thread::spawn(move || {
        let (mut stream, peer) = listener.accept().unwrap();
        run_session(&mut stream, 1, peer)
    });

    let client = Client::connect(&addr, "quitter", 3).unwrap();
    drop(client);

    let result = dealer.join().unwrap();
    assert!(matches!(result, Err(SessionError::ConnectionClosed)));
}

#[test]
fn outcomes_are_reported_once_per_round() {
    let server = RunningServer::start();

    let mut client = Client::connect(&server.addr, "bot", 1).unwrap();
    let mut events: Vec<RoundEvent> = Vec::new();
    let report = client
        .play_round(&mut HitBelow::default(), &mut events)
        .unwrap();
    assert!(matches!(
        report.outcome,
        Outcome::Win | Outcome::Loss | Outcome::Tie
    ));
    assert!(matches!(
        events.last(),
        Some(RoundEvent::RoundResult { outcome, .. }) if *outcome == report.outcome
    ));

    server.stop();
}
