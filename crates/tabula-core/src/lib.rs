//! tabula-core - UI-agnostic document model, configuration + snapshot storage.

pub mod config;
pub mod document;
pub mod error;
pub mod storage;

pub use config::Config;
pub use document::{CellUpdate, Document};
pub use error::{Result, TabulaError};
pub use storage::Snapshot;

pub use tabula_engine::engine::{CellRef, DataType};
