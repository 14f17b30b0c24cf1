//! Error types for Tabula core.

use thiserror::Error;

use tabula_engine::engine::{AddressError, ValidationError};

/// Errors that can occur in the Tabula document model
#[derive(Error, Debug)]
pub enum TabulaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid address: {0}")]
    Address(#[from] AddressError),

    /// A literal was refused for the cell's declared type. Displays the
    /// bare reason so callers can show it as-is.
    #[error("{0}")]
    Rejected(#[from] ValidationError),

    #[error("No file path set")]
    NoFilePath,

    #[error("Clipboard is empty")]
    EmptyClipboard,
}

pub type Result<T> = std::result::Result<T, TabulaError>;
