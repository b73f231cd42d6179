//! Configuration management for lanwake
//!
//! Every value resolves as env var > TOML file > built-in default.

pub mod file;

use std::net::IpAddr;
use std::path::PathBuf;

use crate::wake::{DEFAULT_BROADCAST, DEFAULT_PORT};
use crate::{Error, Result};

use file::LanwakeConfigFile;

/// Default API server port
pub const DEFAULT_API_PORT: u16 = 3000;

/// Default global rate limit (requests per minute)
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// lanwake configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to data directory (database, legacy device list)
    pub data_dir: PathBuf,

    /// `SQLite` database path
    pub db_path: PathBuf,

    /// Legacy JSON device list consumed once by an empty store
    pub legacy_devices_file: PathBuf,

    /// HTTP API server configuration
    pub api_server: ApiServerConfig,

    /// Magic packet configuration
    pub wake: WakeConfig,
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Host to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Global requests per minute; `0` disables rate limiting
    pub rate_limit_per_minute: u32,
}

/// Magic packet configuration
#[derive(Debug, Clone, Copy)]
pub struct WakeConfig {
    /// Broadcast address for devices without one
    pub broadcast: IpAddr,

    /// UDP destination port
    pub port: u16,
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            broadcast: DEFAULT_BROADCAST,
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Load configuration from the environment and the TOML config file
    ///
    /// # Errors
    ///
    /// Returns error if a configured broadcast address is invalid
    pub fn load() -> Result<Self> {
        let path = file::config_file_path();
        let fc = file::load_config_file(path.as_deref());
        Self::resolve(fc, |key| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed file and an env lookup
    ///
    /// # Errors
    ///
    /// Returns error if a configured broadcast address is invalid
    pub fn resolve<F>(fc: LanwakeConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Data directory (~/.local/share/lanwake on Linux)
        let data_dir = env("LANWAKE_DATA_DIR")
            .map(PathBuf::from)
            .or(fc.storage.data_dir)
            .unwrap_or_else(default_data_dir);

        let db_path = env("LANWAKE_DB")
            .map(PathBuf::from)
            .or(fc.storage.db_path)
            .unwrap_or_else(|| data_dir.join("devices.db"));

        let legacy_devices_file = env("LANWAKE_DEVICES_FILE")
            .map(PathBuf::from)
            .or(fc.storage.legacy_devices_file)
            .unwrap_or_else(|| data_dir.join("devices.json"));

        let api_server = ApiServerConfig {
            host: env("LANWAKE_HOST")
                .or(fc.server.host)
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: env("LANWAKE_PORT")
                .or_else(|| env("PORT"))
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(DEFAULT_API_PORT),
            rate_limit_per_minute: env("LANWAKE_RATE_LIMIT")
                .and_then(|s| s.parse().ok())
                .or(fc.server.rate_limit_per_minute)
                .unwrap_or(DEFAULT_RATE_LIMIT),
        };

        let broadcast = match env("LANWAKE_BROADCAST").or(fc.wake.broadcast) {
            Some(addr) => addr
                .parse()
                .map_err(|_| Error::Config(format!("invalid broadcast address: {addr}")))?,
            None => DEFAULT_BROADCAST,
        };
        let wake = WakeConfig {
            broadcast,
            port: env("LANWAKE_WAKE_PORT")
                .and_then(|s| s.parse().ok())
                .or(fc.wake.port)
                .unwrap_or(DEFAULT_PORT),
        };

        Ok(Self {
            data_dir,
            db_path,
            legacy_devices_file,
            api_server,
            wake,
        })
    }
}

fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".local/share/lanwake"),
        |d| d.data_dir().join("lanwake"),
    )
}
