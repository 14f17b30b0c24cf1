//! Rhai engine creation and formula evaluation.
//!
//! A formula is first matched against the keyword table (`SUM(A1:A3)`,
//! `UPPER(B2)`, ...). Anything else is arithmetic: it is preprocessed into a
//! plain Rhai expression and evaluated by an engine with the range
//! aggregates and unary math functions registered. Evaluation is total:
//! every failure becomes a sentinel display string.

use rhai::{Dynamic, Engine, EvalAltResult};

use super::format::{self, ERROR, REF};
use super::preprocess::preprocess_formula;
use super::{CellRange, CellRef, Grid, parse_number};
use crate::builtins::{self, aggregate_by_name, text_transform_by_name};

/// Default operation budget for one formula evaluation.
pub const DEFAULT_MAX_OPERATIONS: u64 = 100_000;

/// Create a Rhai engine with built-ins registered.
pub fn create_engine(grid: Grid) -> Engine {
    create_engine_with_limits(grid, DEFAULT_MAX_OPERATIONS)
}

/// Create a Rhai engine with built-ins registered and an operation budget.
pub fn create_engine_with_limits(grid: Grid, max_operations: u64) -> Engine {
    let mut engine = Engine::new();
    engine.set_max_operations(max_operations);
    engine.set_max_expr_depths(64, 32);
    engine.set_max_string_size(10_000);
    builtins::register_builtins(&mut engine, grid);
    engine
}

/// Evaluates formula text against a shared grid.
pub struct Evaluator {
    engine: Engine,
    grid: Grid,
}

impl Evaluator {
    pub fn new(grid: Grid) -> Self {
        Self::with_limits(grid, DEFAULT_MAX_OPERATIONS)
    }

    pub fn with_limits(grid: Grid, max_operations: u64) -> Self {
        let engine = create_engine_with_limits(grid.clone(), max_operations);
        Evaluator { engine, grid }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Evaluate `formula` to its display string.
    ///
    /// Text without the leading `=` is returned unchanged.
    pub fn evaluate(&self, formula: &str) -> String {
        let Some(body) = formula.strip_prefix('=') else {
            return formula.to_string();
        };
        let body = body.trim();
        if body.contains(REF) {
            return REF.to_string();
        }

        if let Some(result) = self.eval_keyword(body) {
            return result;
        }

        let processed = preprocess_formula(body, |cell| self.numeric_value(cell));
        match self.engine.eval_expression::<Dynamic>(&processed) {
            Ok(value) => format::format_dynamic(&value),
            Err(err) => {
                log::debug!("formula '{}' failed: {}", formula, err);
                sentinel_from_error(&err)
            }
        }
    }

    /// `NAME(arg)` forms from the keyword table, when the whole formula is
    /// a single call with no nested parentheses.
    fn eval_keyword(&self, body: &str) -> Option<String> {
        let open = body.find('(')?;
        let name = &body[..open];
        let arg = body[open + 1..].strip_suffix(')')?;
        if arg.contains(['(', ')']) {
            return None;
        }
        let arg = arg.trim();

        if let Some(kind) = aggregate_by_name(name) {
            let result = match CellRange::parse(arg) {
                Ok(range) => match builtins::aggregate(kind, &range, &self.grid) {
                    Ok(n) => format::format_number(n),
                    Err(sentinel) => sentinel.to_string(),
                },
                Err(_) => ERROR.to_string(),
            };
            return Some(result);
        }

        if let Some(kind) = text_transform_by_name(name) {
            let result = match CellRef::parse(arg) {
                Ok(cell) if !arg.contains(':') => builtins::transform_text(kind, &cell, &self.grid),
                _ => ERROR.to_string(),
            };
            return Some(result);
        }

        None
    }

    /// Value substituted for a single reference: the computed value as a
    /// number, 0 when missing or non-numeric.
    fn numeric_value(&self, cell: &CellRef) -> f64 {
        self.grid
            .get(cell)
            .and_then(|c| parse_number(&c.computed))
            .unwrap_or(0.0)
    }
}

/// Built-ins report sentinels (e.g. `#DIV/0!`) as runtime errors carrying
/// the sentinel text; everything else is a plain `#ERROR!`.
fn sentinel_from_error(err: &EvalAltResult) -> String {
    match err {
        EvalAltResult::ErrorRuntime(value, _) => match value.clone().into_string() {
            Ok(text) if format::is_error_value(&text) => text,
            _ => ERROR.to_string(),
        },
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => sentinel_from_error(inner),
        _ => ERROR.to_string(),
    }
}

/// Evaluate a formula against `grid` with a throwaway engine.
pub fn evaluate_formula(formula: &str, grid: &Grid) -> String {
    Evaluator::new(grid.clone()).evaluate(formula)
}
