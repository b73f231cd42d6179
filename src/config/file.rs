//! TOML configuration file loading
//!
//! Supports `~/.config/lanwake/config.toml` as a persistent config source.
//! All fields are optional and overlay the built-in defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct LanwakeConfigFile {
    /// Storage locations
    #[serde(default)]
    pub storage: StorageFileConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Magic packet defaults
    #[serde(default)]
    pub wake: WakeFileConfig,
}

/// Storage configuration
#[derive(Debug, Default, Deserialize)]
pub struct StorageFileConfig {
    /// Directory for the database and legacy files
    pub data_dir: Option<PathBuf>,

    /// `SQLite` database path
    pub db_path: Option<PathBuf>,

    /// JSON device list imported into an empty store
    pub legacy_devices_file: Option<PathBuf>,
}

/// Server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Bind host
    pub host: Option<String>,

    /// API server port
    pub port: Option<u16>,

    /// Requests per minute across all clients (0 disables)
    pub rate_limit_per_minute: Option<u32>,
}

/// Wake configuration
#[derive(Debug, Default, Deserialize)]
pub struct WakeFileConfig {
    /// Broadcast address for devices without one
    pub broadcast: Option<String>,

    /// UDP destination port
    pub port: Option<u16>,
}

/// Load the TOML config file from `path`
///
/// Returns `LanwakeConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file(path: Option<&Path>) -> LanwakeConfigFile {
    let Some(path) = path else {
        return LanwakeConfigFile::default();
    };

    if !path.exists() {
        return LanwakeConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                LanwakeConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            LanwakeConfigFile::default()
        }
    }
}

/// Return the config file path: `LANWAKE_CONFIG` or `~/.config/lanwake/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    std::env::var("LANWAKE_CONFIG").map(PathBuf::from).ok().or_else(|| {
        directories::BaseDirs::new().map(|d| d.config_dir().join("lanwake").join("config.toml"))
    })
}
