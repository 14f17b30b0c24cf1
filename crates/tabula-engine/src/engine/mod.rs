//! Spreadsheet engine API.
//!
//! This module provides the core computation engine for the spreadsheet:
//!
//! - [`Cell`], [`Grid`], [`Style`] - Data structures for cell storage
//! - [`CellRef`] - Cell reference parsing (A1 notation ↔ col/row indices)
//! - [`CellRange`], [`expand_range`] - Rectangular ranges, column-major
//! - [`classify`] - Literal typing against a declared [`DataType`]
//! - [`Evaluator`] - Formula evaluation (keywords + Rhai arithmetic)
//! - [`extract_dependencies`], [`find_cycle_with`] - Formula dependency graph
//! - [`propagate`], [`recalculate_all`] - Dependency cascade
//! - [`shift_formula_references`], [`offset_formula_references`] - Reference rewriting
//! - [`format_number`] - Number display

mod cell;
mod cell_ref;
mod classify;
mod cycle;
mod deps;
mod eval;
pub mod format;
mod preprocess;
mod propagate;
mod range;
mod style;

pub use cell::{Cell, Grid, new_grid};
pub use cell_ref::{AddressError, CellRef, column_index, column_label, split_address};
pub use classify::{
    DataType, ValidationError, ValueKind, classify, display_value, parse_date, parse_number,
};
pub use cycle::find_cycle_with;
pub use deps::extract_dependencies;
pub use eval::{
    DEFAULT_MAX_OPERATIONS, Evaluator, create_engine, create_engine_with_limits, evaluate_formula,
};
pub use format::{format_dynamic, format_number, is_error_value};
pub use preprocess::{
    ShiftOperation, offset_formula_references, preprocess_formula, shift_formula_references,
};
pub use propagate::{
    Dependents, build_dependents, collect_dependents, propagate, recalculate_all,
    recalculate_cells,
};
pub use range::{CellRange, expand_range};
pub use style::{Alignment, DEFAULT_FONT_SIZE, Style, StyleUpdate};

pub use rhai::Dynamic;
