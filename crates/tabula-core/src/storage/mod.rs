//! Persistence formats.

pub mod json;

pub use json::{Snapshot, SnapshotCell, read_snapshot, write_snapshot};
