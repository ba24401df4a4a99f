//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Turn length
    pub turn_ms: u64,
    /// Driver cadence
    pub tick_interval_ms: u64,
    /// Votes are refused this close to resolution
    pub lock_window_ms: u64,
    /// How long a result stays up before the session returns to start
    pub result_reset_ms: u64,

    /// Map loaded at boot
    pub default_map: String,
    /// Optional JSON file with extra map definitions
    pub maps_file: Option<PathBuf>,
    /// Start the session automatically whenever it sits in `start`
    pub auto_start: bool,

    /// Opponent policy name (`random` or `idle`)
    pub opponent: String,
    /// Fixed opponent seed; the map seed is used when unset
    pub opponent_seed: Option<u64>,

    /// Max votes per second per voter
    pub vote_rate_limit: u32,
    /// Allowed client origins for CORS (comma-separated, `*` for any)
    pub client_origin: String,
    /// Bearer token for admin routes; admin routes are open when unset
    pub admin_token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // PORT wins over SERVER_ADDR so hosted platforms can inject it
        let server_addr = if let Some(port) = lookup("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:5173".to_string())
        };

        let defaults = Self::default();

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),

            turn_ms: parse_or(&lookup, "TURN_MS", defaults.turn_ms)?,
            tick_interval_ms: parse_or(&lookup, "TICK_INTERVAL_MS", defaults.tick_interval_ms)?,
            lock_window_ms: parse_or(&lookup, "LOCK_WINDOW_MS", defaults.lock_window_ms)?,
            result_reset_ms: parse_or(&lookup, "RESULT_RESET_MS", defaults.result_reset_ms)?,

            default_map: lookup("DEFAULT_MAP").unwrap_or(defaults.default_map),
            maps_file: lookup("MAPS_FILE")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            auto_start: parse_or(&lookup, "AUTO_START", defaults.auto_start)?,

            opponent: lookup("OPPONENT").unwrap_or(defaults.opponent),
            opponent_seed: lookup("OPPONENT_SEED")
                .map(|raw| parse_var("OPPONENT_SEED", &raw))
                .transpose()?,

            vote_rate_limit: parse_or(&lookup, "VOTE_RATE_LIMIT", defaults.vote_rate_limit)?,
            client_origin: lookup("CLIENT_ORIGIN").unwrap_or(defaults.client_origin),
            admin_token: lookup("ADMIN_TOKEN").filter(|s| !s.is_empty()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 5173)),
            log_level: "info".to_string(),
            turn_ms: 2000,
            tick_interval_ms: 100,
            lock_window_ms: 200,
            result_reset_ms: 2000,
            default_map: "islands".to_string(),
            maps_file: None,
            auto_start: true,
            opponent: "random".to_string(),
            opponent_seed: None,
            vote_rate_limit: 5,
            client_origin: "*".to_string(),
            admin_token: None,
        }
    }
}

fn parse_var<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        var: key,
        value: raw.to_string(),
    })
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => parse_var(key, &raw),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}
