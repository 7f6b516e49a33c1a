//! Dealer configuration.
//!
//! Values come from command-line overrides first, then the environment
//! (including a `.env` file loaded by `main`), then built-in defaults.

use lan_blackjack::{
    DealerConfig,
    discovery::{BROADCAST_INTERVAL, BroadcastConfig, DISCOVERY_PORT},
    server::{DEFAULT_SERVER_NAME, READ_TIMEOUT},
};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    str::FromStr,
    time::Duration,
};

/// Complete dealer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Name announced in discovery offers
    pub server_name: String,
    /// Interface for the game listener
    pub bind_ip: IpAddr,
    /// UDP port players scan on
    pub discovery_port: u16,
    /// Address offers are broadcast to
    pub broadcast_ip: IpAddr,
    pub broadcast_interval: Duration,
    /// How long a session waits on a silent player
    pub read_timeout: Duration,
}

/// Values given on the command line. `None` falls through to the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub server_name: Option<String>,
    pub bind_ip: Option<IpAddr>,
    pub discovery_port: Option<u16>,
    pub broadcast_ip: Option<IpAddr>,
    pub interval_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
}

impl ServerConfig {
    /// Load configuration from overrides and environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but can't be parsed.
    pub fn from_env(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let server_name = match overrides.server_name {
            Some(name) => name,
            None => std::env::var("BJ_SERVER_NAME").unwrap_or_else(|_| DEFAULT_SERVER_NAME.to_string()),
        };

        let bind_ip = match overrides.bind_ip {
            Some(ip) => ip,
            None => parse_env_or("BJ_BIND_IP", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?,
        };
        let discovery_port = match overrides.discovery_port {
            Some(port) => port,
            None => parse_env_or("BJ_DISCOVERY_PORT", DISCOVERY_PORT)?,
        };
        let broadcast_ip = match overrides.broadcast_ip {
            Some(ip) => ip,
            None => parse_env_or("BJ_BROADCAST_ADDR", IpAddr::V4(Ipv4Addr::BROADCAST))?,
        };
        let interval_ms = match overrides.interval_ms {
            Some(ms) => ms,
            None => parse_env_or("BJ_BROADCAST_INTERVAL_MS", BROADCAST_INTERVAL.as_millis() as u64)?,
        };
        let timeout_secs = match overrides.timeout_secs {
            Some(secs) => secs,
            None => parse_env_or("BJ_READ_TIMEOUT_SECS", READ_TIMEOUT.as_secs())?,
        };

        Ok(Self {
            server_name,
            bind_ip,
            discovery_port,
            broadcast_ip,
            broadcast_interval: Duration::from_millis(interval_ms),
            read_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                var: "BJ_SERVER_NAME".to_string(),
                reason: "Must not be empty".to_string(),
            });
        }

        if self.server_name.len() > 32 {
            log::warn!(
                "server name {:?} is longer than 32 bytes and will be truncated in offers",
                self.server_name
            );
        }

        if self.discovery_port == 0 {
            return Err(ConfigError::Invalid {
                var: "BJ_DISCOVERY_PORT".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.broadcast_interval.is_zero() {
            return Err(ConfigError::Invalid {
                var: "BJ_BROADCAST_INTERVAL_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.read_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "BJ_READ_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    #[must_use]
    pub fn dealer_config(&self) -> DealerConfig {
        DealerConfig {
            server_name: self.server_name.clone(),
            bind_ip: self.bind_ip,
            read_timeout: self.read_timeout,
            broadcast: Some(BroadcastConfig {
                target: SocketAddr::new(self.broadcast_ip, self.discovery_port),
                interval: self.broadcast_interval,
            }),
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse an environment variable with a default for when it's unset.
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value.trim().parse().map_err(|error: T::Err| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("{value:?}: {error}"),
        }),
        Err(_) => Ok(default),
    }
}
