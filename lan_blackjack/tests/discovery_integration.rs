//! Discovery over loopback UDP: broadcasters aimed at a local scanner.

use lan_blackjack::{
    ServerInfo,
    discovery::{BroadcastConfig, Broadcaster, scan_socket},
    packets::{Offer, encode_offer},
};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket},
    time::{Duration, Instant},
};

const WINDOW: Duration = Duration::from_millis(600);
const RECV_TIMEOUT: Duration = Duration::from_millis(100);

fn scanner() -> (UdpSocket, SocketAddr) {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr().unwrap();
    (socket, addr)
}

fn aimed_at(target: SocketAddr) -> BroadcastConfig {
    BroadcastConfig {
        target,
        interval: Duration::from_millis(50),
    }
}

#[test]
fn broadcaster_is_found_by_name() {
    let (socket, addr) = scanner();
    let _broadcaster = Broadcaster::spawn(aimed_at(addr), &Offer::new(4242, "Table One")).unwrap();

    let servers = scan_socket(&socket, WINDOW, RECV_TIMEOUT).unwrap();
    assert_eq!(
        servers.get("Table One"),
        Some(&ServerInfo {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            tcp_port: 4242,
        })
    );
}

#[test]
fn several_dealers_are_collected() {
    let (socket, addr) = scanner();
    let _first = Broadcaster::spawn(aimed_at(addr), &Offer::new(1000, "First")).unwrap();
    let _second = Broadcaster::spawn(aimed_at(addr), &Offer::new(2000, "Second")).unwrap();

    let servers = scan_socket(&socket, WINDOW, RECV_TIMEOUT).unwrap();
    assert_eq!(servers.len(), 2);
    assert_eq!(servers["First"].tcp_port, 1000);
    assert_eq!(servers["Second"].socket_addr().port(), 2000);
}

#[test]
fn junk_datagrams_are_skipped() {
    let (socket, addr) = scanner();
    let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
    sender.send_to(b"not an offer", addr).unwrap();
    let mut wrong_cookie = encode_offer(3000, "Impostor");
    wrong_cookie[3] = 0;
    sender.send_to(&wrong_cookie, addr).unwrap();
    sender.send_to(&encode_offer(3000, "Genuine"), addr).unwrap();

    let servers = scan_socket(&socket, Duration::from_millis(300), RECV_TIMEOUT).unwrap();
    assert_eq!(servers.keys().collect::<Vec<_>>(), vec!["Genuine"]);
}

#[test]
fn silent_network_yields_an_empty_map_after_the_window() {
    let (socket, _) = scanner();
    let started = Instant::now();
    let servers = scan_socket(&socket, Duration::from_millis(250), RECV_TIMEOUT).unwrap();
    assert!(servers.is_empty());
    assert!(started.elapsed() >= Duration::from_millis(250));
}

#[test]
fn stopping_the_broadcaster_ends_the_offers() {
    let (socket, addr) = scanner();
    let broadcaster = Broadcaster::spawn(aimed_at(addr), &Offer::new(5000, "Brief")).unwrap();
    broadcaster.stop();

    // Drain whatever was sent before the stop.
    let _ = scan_socket(&socket, Duration::from_millis(150), RECV_TIMEOUT).unwrap();
    let servers = scan_socket(&socket, Duration::from_millis(300), RECV_TIMEOUT).unwrap();
    assert!(servers.is_empty());
}
