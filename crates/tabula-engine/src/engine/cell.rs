//! Cell data structures for the spreadsheet grid.
//!
//! This module provides the core data types for representing cells:
//! - [`Cell`] - Raw input, formula text, declared/effective type, computed
//!   display value and style
//! - [`Grid`] - Thread-safe sparse storage for cells (backed by `DashMap`)

use dashmap::DashMap;
use std::sync::Arc;

use super::cell_ref::CellRef;
use super::classify::{DataType, ValueKind, display_value};
use super::deps::extract_dependencies;
use super::style::Style;

/// A cell in the spreadsheet grid.
///
/// `computed` always holds the last evaluation of `formula` when it is
/// non-empty, otherwise the (possibly reformatted) literal in `raw_value`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    /// Text exactly as the user committed it.
    pub raw_value: String,
    /// Formula text including the leading `=`; empty for literals.
    pub formula: String,
    /// Declared type intent.
    pub data_type: DataType,
    /// Effective type of the stored value.
    pub kind: ValueKind,
    /// Display value shown by the grid.
    pub computed: String,
    pub style: Style,
    /// References found in `formula` (ranges expanded). Kept in sync by the
    /// constructors and setters below.
    pub depends_on: Vec<CellRef>,
}

impl Cell {
    pub fn new_empty() -> Cell {
        Cell::default()
    }

    /// A literal cell whose kind has already been decided by the classifier.
    pub fn new_literal(raw: &str, kind: ValueKind, date_format: &str) -> Cell {
        let mut cell = Cell::default();
        cell.set_literal(raw, kind, date_format);
        cell
    }

    /// Create a new cell containing a formula (with its leading `=`).
    /// Dependencies are automatically extracted from the formula.
    pub fn new_formula(formula: &str) -> Cell {
        let mut cell = Cell::default();
        cell.set_formula(formula);
        cell
    }

    pub fn is_formula(&self) -> bool {
        !self.formula.is_empty()
    }

    /// True when the cell shows nothing (absent cells behave the same way).
    pub fn is_blank(&self) -> bool {
        self.computed.is_empty()
    }

    /// Replace the content with a literal, keeping style and declared type.
    pub fn set_literal(&mut self, raw: &str, kind: ValueKind, date_format: &str) {
        self.raw_value = raw.to_string();
        self.formula.clear();
        self.depends_on.clear();
        self.kind = kind;
        self.computed = display_value(raw, kind, date_format);
    }

    /// Replace the content with a formula, keeping style and declared type.
    /// `computed` is left for the caller to fill in.
    pub fn set_formula(&mut self, formula: &str) {
        self.raw_value = formula.to_string();
        self.formula = formula.to_string();
        self.depends_on = extract_dependencies(formula);
    }

    /// Store an evaluation result and derive the effective kind from it.
    pub fn set_computed(&mut self, computed: String) {
        self.kind = if super::classify::parse_number(&computed).is_some() {
            ValueKind::Number
        } else {
            ValueKind::Text
        };
        self.computed = computed;
    }

    /// Drop content but keep style and declared type.
    pub fn clear_content(&mut self) {
        self.raw_value.clear();
        self.formula.clear();
        self.depends_on.clear();
        self.kind = ValueKind::Text;
        self.computed.clear();
    }

    /// True when the cell carries nothing worth storing.
    pub fn is_default(&self) -> bool {
        self.raw_value.is_empty()
            && self.formula.is_empty()
            && self.computed.is_empty()
            && self.data_type == DataType::Auto
            && self.style == Style::default()
    }
}

/// Thread-safe sparse grid storage, shared with the formula built-ins.
pub type Grid = Arc<DashMap<CellRef, Cell>>;

/// Create an empty grid.
pub fn new_grid() -> Grid {
    Arc::new(DashMap::new())
}
