//! Built-in spreadsheet functions (Rust) and their metadata.
//!
//! Conventions:
//! - Spreadsheet-facing built-in names are ALL CAPS (e.g. `SUM`, `AVERAGE`).
//! - Aggregates used inside a larger expression are rewritten to ALLCAPS Rhai
//!   function names taking range corners (e.g. `SUM_RANGE(c1, r1, c2, r2)`).
//! - If you add a new aggregate, extend [`Aggregate`], `AGGREGATES` and
//!   register it in [`register_builtins`].

use crate::engine::format::{DIV_ZERO, ERROR};
use crate::engine::{CellRange, CellRef, Grid, parse_number};
use regex::Regex;
use rhai::{Engine, EvalAltResult, Position};
use std::sync::OnceLock;

/// Range aggregates available both as whole-formula keywords and inside
/// arithmetic expressions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aggregate {
    Sum,
    Average,
    Count,
    Max,
    Min,
}

/// Single-cell text transforms, only available as whole-formula keywords.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextTransform {
    Trim,
    Upper,
    Lower,
}

pub struct AggregateBuiltin {
    pub sheet_name: &'static str,
    pub rhai_name: &'static str,
    pub kind: Aggregate,
}

pub const AGGREGATES: &[AggregateBuiltin] = &[
    AggregateBuiltin {
        sheet_name: "SUM",
        rhai_name: "SUM_RANGE",
        kind: Aggregate::Sum,
    },
    AggregateBuiltin {
        sheet_name: "AVERAGE",
        rhai_name: "AVERAGE_RANGE",
        kind: Aggregate::Average,
    },
    AggregateBuiltin {
        sheet_name: "COUNT",
        rhai_name: "COUNT_RANGE",
        kind: Aggregate::Count,
    },
    AggregateBuiltin {
        sheet_name: "MAX",
        rhai_name: "MAX_RANGE",
        kind: Aggregate::Max,
    },
    AggregateBuiltin {
        sheet_name: "MIN",
        rhai_name: "MIN_RANGE",
        kind: Aggregate::Min,
    },
];

pub const TEXT_TRANSFORMS: &[(&str, TextTransform)] = &[
    ("TRIM", TextTransform::Trim),
    ("UPPER", TextTransform::Upper),
    ("LOWER", TextTransform::Lower),
];

/// Unary math functions callable from arithmetic formulas.
const UNARY_MATH: &[(&str, fn(f64) -> f64)] = &[
    ("abs", f64::abs),
    ("sqrt", f64::sqrt),
    ("exp", f64::exp),
    ("ln", f64::ln),
    ("log10", f64::log10),
    ("sin", f64::sin),
    ("cos", f64::cos),
    ("tan", f64::tan),
    ("floor", f64::floor),
    ("ceil", f64::ceil),
    ("round", f64::round),
];

/// Regex that matches aggregate calls like `SUM(A1:B5)` or `MAX($C$2)`.
///
/// Captures:
/// - group 1: function name (e.g. `SUM`)
/// - group 2: start cell ref (e.g. `A1`)
/// - group 3: optional end cell ref (e.g. `B5`)
pub fn range_fn_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let names = AGGREGATES
            .iter()
            .map(|b| b.sheet_name)
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(
            r"\b({})\(\s*(\$?[A-Z]+\$?[0-9]+)(?:\s*:\s*(\$?[A-Z]+\$?[0-9]+))?\s*\)",
            names
        ))
        .expect("built-in range regex must compile")
    })
}

pub fn range_rhai_name(sheet_name: &str) -> Option<&'static str> {
    AGGREGATES
        .iter()
        .find(|b| b.sheet_name == sheet_name)
        .map(|b| b.rhai_name)
}

pub fn aggregate_by_name(sheet_name: &str) -> Option<Aggregate> {
    AGGREGATES
        .iter()
        .find(|b| b.sheet_name == sheet_name)
        .map(|b| b.kind)
}

pub fn text_transform_by_name(sheet_name: &str) -> Option<TextTransform> {
    TEXT_TRANSFORMS
        .iter()
        .find(|(name, _)| *name == sheet_name)
        .map(|(_, t)| *t)
}

/// Computed display value of a cell, empty if absent.
pub(crate) fn computed_value(grid: &Grid, cell_ref: &CellRef) -> String {
    grid.get(cell_ref)
        .map(|cell| cell.computed.clone())
        .unwrap_or_default()
}

/// Evaluate an aggregate over a range of computed values.
///
/// Non-numeric values count as 0. AVERAGE divides by every cell in the
/// range, absent ones included; MAX and MIN skip blank and absent cells.
/// A range with no non-blank cell gives `#DIV/0!` for AVERAGE and `#ERROR!`
/// for MAX/MIN. `Err` carries the sentinel to display.
pub fn aggregate(kind: Aggregate, range: &CellRange, grid: &Grid) -> Result<f64, &'static str> {
    let mut cells = 0usize;
    let mut count = 0usize;
    let mut numeric = 0usize;
    let mut sum = 0.0;
    let mut max = f64::NEG_INFINITY;
    let mut min = f64::INFINITY;

    for cell_ref in range.iter() {
        cells += 1;
        let Some(cell) = grid.get(&cell_ref) else {
            continue;
        };
        if cell.is_blank() {
            continue;
        }
        let parsed = parse_number(&cell.computed);
        if parsed.is_some() {
            numeric += 1;
        }
        let n = parsed.unwrap_or(0.0);
        count += 1;
        sum += n;
        max = max.max(n);
        min = min.min(n);
    }

    match kind {
        Aggregate::Sum => Ok(sum),
        Aggregate::Count => Ok(numeric as f64),
        Aggregate::Average if count == 0 => Err(DIV_ZERO),
        Aggregate::Average => Ok(sum / cells as f64),
        Aggregate::Max | Aggregate::Min if count == 0 => Err(ERROR),
        Aggregate::Max => Ok(max),
        Aggregate::Min => Ok(min),
    }
}

/// Apply a text transform to the computed value of one cell.
pub fn transform_text(kind: TextTransform, cell_ref: &CellRef, grid: &Grid) -> String {
    let value = computed_value(grid, cell_ref);
    match kind {
        TextTransform::Trim => value.trim().to_string(),
        TextTransform::Upper => value.to_uppercase(),
        TextTransform::Lower => value.to_lowercase(),
    }
}

fn invalid_arg(message: &str) -> Box<EvalAltResult> {
    EvalAltResult::ErrorRuntime(message.into(), Position::NONE).into()
}

fn to_usize(value: i64, label: &str) -> Result<usize, Box<EvalAltResult>> {
    usize::try_from(value).map_err(|_| invalid_arg(&format!("{} must be >= 0", label)))
}

fn range_from_args(c1: i64, r1: i64, c2: i64, r2: i64) -> Result<CellRange, Box<EvalAltResult>> {
    Ok(CellRange::new(
        CellRef::new(to_usize(c1, "column")?, to_usize(r1, "row")?),
        CellRef::new(to_usize(c2, "column")?, to_usize(r2, "row")?),
    ))
}

/// Register the range aggregates and unary math functions on `engine`.
/// Aggregates read computed values straight from the shared grid.
pub fn register_builtins(engine: &mut Engine, grid: Grid) {
    for builtin in AGGREGATES {
        let grid = grid.clone();
        let kind = builtin.kind;
        engine.register_fn(
            builtin.rhai_name,
            move |c1: i64, r1: i64, c2: i64, r2: i64| -> Result<f64, Box<EvalAltResult>> {
                let range = range_from_args(c1, r1, c2, r2)?;
                aggregate(kind, &range, &grid).map_err(invalid_arg)
            },
        );
    }

    for (name, f) in UNARY_MATH {
        let f = *f;
        engine.register_fn(*name, move |x: f64| f(x));
    }
}
