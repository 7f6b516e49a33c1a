//! LAN blackjack dealer.
//!
//! Broadcasts offers on the local network and plays every connecting
//! player in its own thread until interrupted.

mod config;

use std::{
    net::{IpAddr, UdpSocket},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::{Error, bail};
use config::{ConfigOverrides, ServerConfig};
use ctrlc::set_handler;
use lan_blackjack::Server;
use log::{LevelFilter, info};
use pico_args::Arguments;

const HELP: &str = "\
Run a LAN blackjack dealer

USAGE:
  bj_server [OPTIONS]

OPTIONS:
  --name            NAME    Name announced to players       [default: env BJ_SERVER_NAME or Blackjack Dealer]
  --bind            IP      Interface for game connections  [default: env BJ_BIND_IP or 0.0.0.0]
  --discovery-port  PORT    UDP port offers are sent to     [default: env BJ_DISCOVERY_PORT or 13122]
  --broadcast-addr  IP      Address offers are sent to      [default: env BJ_BROADCAST_ADDR or 255.255.255.255]
  --interval-ms     MS      Time between offers             [default: env BJ_BROADCAST_INTERVAL_MS or 1000]
  --timeout-secs    SECS    Idle player timeout             [default: env BJ_READ_TIMEOUT_SECS or 30]

FLAGS:
  -h, --help                Print help information

ENVIRONMENT:
  RUST_LOG                  Log filter (e.g., debug)  [default: info]
  (A .env file in the working directory is read too)
";

fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = ConfigOverrides {
        server_name: pargs.opt_value_from_str("--name")?,
        bind_ip: pargs.opt_value_from_str("--bind")?,
        discovery_port: pargs.opt_value_from_str("--discovery-port")?,
        broadcast_ip: pargs.opt_value_from_str("--broadcast-addr")?,
        interval_ms: pargs.opt_value_from_str("--interval-ms")?,
        timeout_secs: pargs.opt_value_from_str("--timeout-secs")?,
    };
    let remaining = pargs.finish();
    if !remaining.is_empty() {
        bail!("unexpected arguments: {remaining:?}");
    }

    env_logger::builder()
        .format_target(false)
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    let server = Server::bind(config.dealer_config())?;
    let addr = server.local_addr()?;
    info!(
        "Server started, listening on IP address {}",
        local_ip().unwrap_or(addr.ip())
    );
    info!(
        "Dealer {:?} on TCP port {}, offers every {:?} to UDP port {}",
        config.server_name,
        addr.port(),
        config.broadcast_interval,
        config.discovery_port
    );

    // Catching signals for a clean shutdown of the accept loop.
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    set_handler(move || flag.store(true, Ordering::Relaxed))?;

    server.run(shutdown)
}

/// The address other hosts on the LAN would reach us at. Connecting a UDP
/// socket sends nothing; it only picks the outgoing interface.
fn local_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    socket.local_addr().ok().map(|addr| addr.ip())
}
