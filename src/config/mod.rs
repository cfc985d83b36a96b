//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

/// Port used when neither `PORT` nor `SERVER_ADDR` is set
pub const DEFAULT_PORT: u16 = 3000;

/// Frames per second a single connection may send before frames are dropped
pub const DEFAULT_INPUT_RATE_LIMIT: u32 = 120;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origins for CORS; any origin when unset
    pub client_origin: Option<String>,
    /// Fixed seed for spawn positions; entropy when unset
    pub spawn_seed: Option<u64>,
    /// Per-connection input frames per second
    pub input_rate_limit: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // PORT wins over SERVER_ADDR so hosted deployments can inject it
        let server_addr = match env::var("PORT") {
            Ok(port) => {
                let port: u16 = port.parse().map_err(|_| ConfigError::Invalid("PORT"))?;
                SocketAddr::from(([0, 0, 0, 0], port))
            }
            Err(_) => env::var("SERVER_ADDR")
                .unwrap_or_else(|_| format!("0.0.0.0:{DEFAULT_PORT}"))
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
        };

        let spawn_seed = env::var("SPAWN_SEED")
            .ok()
            .map(|s| s.parse().map_err(|_| ConfigError::Invalid("SPAWN_SEED")))
            .transpose()?;

        let input_rate_limit = match env::var("INPUT_RATE_LIMIT") {
            Ok(v) => v
                .parse()
                .map_err(|_| ConfigError::Invalid("INPUT_RATE_LIMIT"))?,
            Err(_) => DEFAULT_INPUT_RATE_LIMIT,
        };

        Ok(Self {
            server_addr,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            client_origin: env::var("CLIENT_ORIGIN").ok().filter(|s| !s.trim().is_empty()),
            spawn_seed,
            input_rate_limit,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            log_level: "info".to_string(),
            client_origin: None,
            spawn_seed: None,
            input_rate_limit: DEFAULT_INPUT_RATE_LIMIT,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
