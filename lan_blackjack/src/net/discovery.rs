//! LAN discovery over UDP broadcast.
//!
//! A dealer announces itself by broadcasting an [`Offer`] at a fixed
//! interval; players listen on the discovery port for a short window and
//! collect every dealer they hear from.

use log::{debug, info, warn};
use std::{
    collections::BTreeMap,
    io,
    net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket},
    sync::mpsc::{self, RecvTimeoutError},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use super::{
    errors::DiscoveryError,
    packets::{Offer, WirePacket, decode_offer},
};

pub const DISCOVERY_PORT: u16 = 13122;
pub const BROADCAST_INTERVAL: Duration = Duration::from_secs(1);
pub const SCAN_WINDOW: Duration = Duration::from_secs(3);
pub const RECV_TIMEOUT: Duration = Duration::from_secs(1);

// Offers are 39 bytes; anything bigger than this is junk anyway.
const DATAGRAM_BUFFER_SIZE: usize = 512;

// Sockets reject a zero read timeout.
const MIN_RECV_TIMEOUT: Duration = Duration::from_millis(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BroadcastConfig {
    /// Where offers are sent. Normally the limited broadcast address, but a
    /// unicast or loopback target works too.
    pub target: SocketAddr,
    pub interval: Duration,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            target: SocketAddr::new(IpAddr::V4(Ipv4Addr::BROADCAST), DISCOVERY_PORT),
            interval: BROADCAST_INTERVAL,
        }
    }
}

/// Background thread that keeps sending the same offer.
///
/// Dropping the handle stops the thread within one interval and waits for
/// it to exit.
#[derive(Debug)]
pub struct Broadcaster {
    stop: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Broadcaster {
    pub fn spawn(config: BroadcastConfig, offer: &Offer) -> Result<Self, DiscoveryError> {
        let socket = bind_broadcast_socket()?;
        let payload = offer.encode();
        let (stop, stopped) = mpsc::channel::<()>();
        info!(
            "broadcasting offer for {:?} (tcp port {}) to {} every {:?}",
            offer.server_name, offer.tcp_port, config.target, config.interval
        );
        let handle = thread::Builder::new()
            .name("broadcaster".to_string())
            .spawn(move || {
                loop {
                    if let Err(error) = socket.send_to(&payload, config.target) {
                        warn!("offer broadcast to {} failed: {error}", config.target);
                    }
                    match stopped.recv_timeout(config.interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("broadcaster stopped");
            })?;
        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Dropping the sender disconnects the channel, which wakes the thread.
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("broadcaster thread panicked");
            }
        }
    }
}

impl Drop for Broadcaster {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn bind_broadcast_socket() -> io::Result<UdpSocket> {
    let socket = UdpSocket::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0))?;
    socket.set_broadcast(true)?;
    Ok(socket)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ScanConfig {
    pub port: u16,
    /// Total time spent listening.
    pub window: Duration,
    /// Upper bound on a single blocking receive.
    pub recv_timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            port: DISCOVERY_PORT,
            window: SCAN_WINDOW,
            recv_timeout: RECV_TIMEOUT,
        }
    }
}

/// Where a discovered dealer accepts game connections.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ServerInfo {
    pub address: IpAddr,
    pub tcp_port: u16,
}

impl ServerInfo {
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.tcp_port)
    }
}

/// Discovered dealers by name.
pub type ServerMap = BTreeMap<String, ServerInfo>;

pub fn bind_scan_socket(port: u16) -> Result<UdpSocket, DiscoveryError> {
    let socket = UdpSocket::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port))?;
    Ok(socket)
}

/// Binds the discovery port and listens for one scan window.
pub fn scan(config: &ScanConfig) -> Result<ServerMap, DiscoveryError> {
    let socket = bind_scan_socket(config.port)?;
    scan_socket(&socket, config.window, config.recv_timeout)
}

/// Listens on an already bound socket until `window` has elapsed.
///
/// Datagrams that aren't valid offers are skipped. If a name is heard more
/// than once, the latest address and port win. An empty map is a normal
/// result, not an error.
pub fn scan_socket(
    socket: &UdpSocket,
    window: Duration,
    recv_timeout: Duration,
) -> Result<ServerMap, DiscoveryError> {
    let deadline = Instant::now() + window;
    let mut servers = ServerMap::new();
    let mut buf = [0u8; DATAGRAM_BUFFER_SIZE];
    loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        let timeout = recv_timeout.min(deadline - now).max(MIN_RECV_TIMEOUT);
        socket.set_read_timeout(Some(timeout))?;
        match socket.recv_from(&mut buf) {
            Ok((len, from)) => handle_datagram(&mut servers, &buf[..len], from),
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::WouldBlock
                        | io::ErrorKind::TimedOut
                        | io::ErrorKind::Interrupted
                        | io::ErrorKind::ConnectionReset
                ) => {}
            Err(error) => return Err(error.into()),
        }
    }
    Ok(servers)
}

fn handle_datagram(servers: &mut ServerMap, bytes: &[u8], from: SocketAddr) {
    match decode_offer(bytes) {
        Ok(offer) => {
            let info = ServerInfo {
                address: from.ip(),
                tcp_port: offer.tcp_port,
            };
            if servers.insert(offer.server_name.clone(), info) != Some(info) {
                debug!(
                    "found dealer {:?} at {}",
                    offer.server_name,
                    info.socket_addr()
                );
            }
        }
        Err(error) => debug!("ignoring datagram from {from}: {error}"),
    }
}
