//! LAN blackjack player.
//!
//! Scans the local network for dealers, connects to the chosen one, and
//! plays the requested rounds either from the keyboard or on autopilot.

use std::{
    io::{self, Write},
    time::Duration,
};

use anyhow::{Error, bail};
use bj_client::{
    commands::MenuChoice,
    terminal::{Prompter, TablePrinter, print_stats},
};
use ctrlc::set_handler;
use lan_blackjack::{
    Client, HitBelow, ScanConfig, ServerInfo, Value, constants::DEALER_STAND_THRESHOLD,
    discovery::{self, DISCOVERY_PORT, SCAN_WINDOW},
};
use log::{LevelFilter, info, warn};
use pico_args::Arguments;

const HELP: &str = "\
Play blackjack against a dealer on the local network

USAGE:
  bj_client [OPTIONS]

OPTIONS:
  --name            NAME    Name sent to the dealer        [default: $USER]
  --rounds          N       Rounds per session (1-255)     [default: ask]
  --discovery-port  PORT    UDP port to listen for offers  [default: 13122]
  --scan-secs       SECS    How long each scan listens     [default: 3]
  --threshold       N       Autopilot hits below this      [default: 17]

FLAGS:
  --auto                    Play on autopilot and stop after one session
  -h, --help                Print help information

ENVIRONMENT:
  RUST_LOG                  Log filter (e.g., debug)  [default: warn]
";

struct Args {
    name: String,
    rounds: Option<u8>,
    scan: ScanConfig,
    auto: bool,
    threshold: Value,
}

fn main() -> Result<(), Error> {
    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let scan_secs: u64 = pargs.opt_value_from_str("--scan-secs")?.unwrap_or(SCAN_WINDOW.as_secs());
    let args = Args {
        name: pargs
            .opt_value_from_str("--name")?
            .unwrap_or_else(whoami::username),
        rounds: pargs.opt_value_from_str("--rounds")?,
        scan: ScanConfig {
            port: pargs
                .opt_value_from_str("--discovery-port")?
                .unwrap_or(DISCOVERY_PORT),
            window: Duration::from_secs(scan_secs),
            ..ScanConfig::default()
        },
        auto: pargs.contains("--auto"),
        threshold: pargs
            .opt_value_from_str("--threshold")?
            .unwrap_or(DEALER_STAND_THRESHOLD),
    };
    let remaining = pargs.finish();
    if !remaining.is_empty() {
        bail!("unexpected arguments: {remaining:?}");
    }
    if args.rounds == Some(0) {
        bail!("--rounds must be between 1 and 255");
    }

    env_logger::builder()
        .format_target(false)
        .filter_level(LevelFilter::Warn)
        .parse_default_env()
        .init();

    set_handler(|| {
        println!("\nGoodbye!");
        std::process::exit(0);
    })?;

    run(args)
}

fn run(args: Args) -> Result<(), Error> {
    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());
    println!("Welcome to LAN blackjack, {}!", args.name);

    loop {
        let rounds = match args.rounds {
            Some(rounds) => rounds,
            None => match prompter.ask_rounds()? {
                Some(rounds) => rounds,
                None => break,
            },
        };
        let Some(server) = find_server(&args, &mut prompter)? else {
            break;
        };

        let addr = server.socket_addr();
        println!("Connecting to {addr}...");
        let client = match Client::connect(&addr, &args.name, u32::from(rounds)) {
            Ok(client) => client,
            Err(error) if args.auto => return Err(error),
            Err(error) => {
                println!("Couldn't connect: {error}");
                continue;
            }
        };
        info!("playing {rounds} rounds against {addr}");

        let mut table = TablePrinter::new(io::stdout());
        let report = if args.auto {
            client.play_session(&mut HitBelow(args.threshold), &mut table)
        } else {
            client.play_session(&mut prompter, &mut table)
        };
        let mut stdout = io::stdout();
        print_stats(&mut stdout, &report.stats)?;
        if let Some(failure) = &report.failure {
            writeln!(stdout, "Session ended early: {failure}")?;
        }

        if args.auto || !prompter.ask_yes("\nPlay again?")? {
            break;
        }
    }

    println!("Goodbye!");
    Ok(())
}

/// Scans until a dealer is picked. `None` means the player gave up.
fn find_server<R, W>(
    args: &Args,
    prompter: &mut Prompter<R, W>,
) -> Result<Option<ServerInfo>, Error>
where
    R: io::BufRead,
    W: Write,
{
    loop {
        println!("Looking for dealers for {:?}...", args.scan.window);
        let servers = match discovery::scan(&args.scan) {
            Ok(servers) => servers,
            Err(error) => {
                warn!("scan failed: {error}");
                Default::default()
            }
        };
        for (name, info) in &servers {
            println!("Found: {name} at {}", info.address);
        }

        if servers.is_empty() {
            if args.auto {
                bail!("no dealers found on UDP port {}", args.scan.port);
            }
            if !prompter.ask_yes("No dealers found. Try again?")? {
                return Ok(None);
            }
            continue;
        }

        // Autopilot takes the first dealer by name.
        if args.auto {
            return Ok(servers.into_values().next());
        }
        match prompter.choose_server(&servers)? {
            Some(MenuChoice::Server(index)) => return Ok(servers.into_values().nth(index)),
            Some(MenuChoice::Rescan) => {}
            None => return Ok(None),
        }
    }
}
