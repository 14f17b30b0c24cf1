//! tabula_engine - Spreadsheet calculation engine + Rhai integration.

pub(crate) mod builtins;
pub mod engine;
