//! Error types for lanwake

use thiserror::Error;

/// Result type alias for lanwake operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lanwake
#[derive(Debug, Error)]
pub enum Error {
    /// A device with the same (case-insensitive) name already exists
    #[error("device already exists: {0}")]
    DuplicateName(String),

    /// MAC address is not six hex octets with a single separator
    #[error("invalid MAC address format: {0}")]
    InvalidMac(String),

    /// Device record is structurally invalid (e.g. empty name)
    #[error("invalid device: {0}")]
    InvalidDevice(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether the caller can fix the request and retry
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateName(_) | Self::InvalidMac(_) | Self::InvalidDevice(_)
        )
    }
}
