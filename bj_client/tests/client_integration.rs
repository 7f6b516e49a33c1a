//! The terminal front-end playing a live dealer over loopback.

use bj_client::terminal::{Prompter, TablePrinter, print_stats};
use lan_blackjack::{Client, DealerConfig, Server};
use std::{
    net::Ipv4Addr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

#[test]
fn typed_session_against_live_dealer() {
    let config = DealerConfig {
        server_name: "Terminal".to_string(),
        bind_ip: Ipv4Addr::LOCALHOST.into(),
        read_timeout: Duration::from_secs(5),
        broadcast: None,
    };
    let server = Server::bind(config).unwrap();
    let addr = server.local_addr().unwrap();
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    let handle = thread::spawn(move || server.run(flag).unwrap());

    // A typo, then stand every time; input runs out before the last round
    // and the player stands by default.
    let typed = "x\ns\ns\n";
    let mut prompter = Prompter::new(typed.as_bytes(), Vec::new());
    let mut table = TablePrinter::new(Vec::new());

    let client = Client::connect(&addr, "typist", 3).unwrap();
    let report = client.play_session(&mut prompter, &mut table);
    assert!(report.is_complete(), "session failed: {:?}", report.failure);
    assert_eq!(report.stats.rounds_played(), 3);
    assert_eq!(report.stats.total_hits, 0);

    let printed = String::from_utf8(table.into_inner()).unwrap();
    assert_eq!(printed.matches("--- Round").count(), 3);
    assert!(printed.contains("Dealer shows"));

    let mut summary = Vec::new();
    print_stats(&mut summary, &report.stats).unwrap();
    assert!(
        String::from_utf8(summary)
            .unwrap()
            .contains("Finished playing 3 rounds")
    );

    shutdown.store(true, Ordering::Relaxed);
    handle.join().unwrap();
}
