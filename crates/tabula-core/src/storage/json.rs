//! JSON snapshots: a flat object mapping each address to the cell's raw
//! value, formula text, declared type and style.
//!
//! ```json
//! {
//!   "A1": { "value": "5", "formula": "", "dataType": "number", "style": { "bold": true } },
//!   "A2": { "value": "=A1*2", "formula": "=A1*2", "dataType": "auto", "style": {} }
//! }
//! ```
//!
//! Missing fields take their defaults. Computed values are not stored; they
//! are recalculated on import.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::Result;
use tabula_engine::engine::{Cell, CellRef, DataType, Grid, Style, ValueKind, classify};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotCell {
    pub value: String,
    pub formula: String,
    pub data_type: DataType,
    pub style: Style,
}

impl SnapshotCell {
    fn from_cell(cell: &Cell) -> SnapshotCell {
        SnapshotCell {
            value: cell.raw_value.clone(),
            formula: cell.formula.clone(),
            data_type: cell.data_type,
            style: cell.style.clone(),
        }
    }

    /// Build a grid cell. Formula cells are left uncomputed; literals are
    /// classified against the declared type but never rejected.
    fn into_cell(self, date_format: &str) -> Cell {
        let mut cell = if self.formula.is_empty() {
            let kind = classify(&self.value, self.data_type).unwrap_or(ValueKind::Text);
            Cell::new_literal(&self.value, kind, date_format)
        } else {
            Cell::new_formula(&self.formula)
        };
        cell.data_type = self.data_type;
        cell.style = self.style;
        cell
    }
}

/// Serializable image of a grid, keyed by address text.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    pub cells: BTreeMap<String, SnapshotCell>,
}

impl Snapshot {
    /// Capture every cell that carries content, a declared type or a style.
    pub fn from_grid(grid: &Grid) -> Snapshot {
        let cells = grid
            .iter()
            .filter(|entry| !entry.value().is_default())
            .map(|entry| (entry.key().to_string(), SnapshotCell::from_cell(entry.value())))
            .collect();
        Snapshot { cells }
    }

    /// Decode into grid cells. Keys that are not addresses are skipped.
    pub fn into_cells(self, date_format: &str) -> Vec<(CellRef, Cell)> {
        let mut cells = Vec::with_capacity(self.cells.len());
        for (addr, snap) in self.cells {
            match CellRef::parse(&addr) {
                Ok(cell_ref) => cells.push((cell_ref, snap.into_cell(date_format))),
                Err(err) => log::warn!("skipping snapshot entry '{}': {}", addr, err),
            }
        }
        cells
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Snapshot> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Write a snapshot to a JSON file.
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    fs::write(path, snapshot.to_json()? + "\n")?;
    Ok(())
}

/// Read a snapshot from a JSON file.
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let content = fs::read_to_string(path)?;
    Snapshot::from_json(&content)
}
