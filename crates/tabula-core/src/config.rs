//! User configuration, read from a TOML file.
//!
//! ```toml
//! date_format = "%d/%m/%Y"
//! rewrite_references = true
//! max_operations = 50000
//! ```
//!
//! Every key is optional; missing keys take their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use tabula_engine::engine::DEFAULT_MAX_OPERATIONS;

/// chrono format used to display date cells.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// chrono format string for date cells.
    pub date_format: String,
    /// Rewrite formula references on row/column insert and delete.
    pub rewrite_references: bool,
    /// Rhai operation budget for one formula evaluation.
    pub max_operations: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            rewrite_references: false,
            max_operations: DEFAULT_MAX_OPERATIONS,
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Config> {
        Ok(toml::from_str(text)?)
    }

    /// Load from `path`. A missing file yields the defaults; a file that
    /// exists but cannot be read or parsed is an error.
    pub fn load(path: &Path) -> Result<Config> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }
}
