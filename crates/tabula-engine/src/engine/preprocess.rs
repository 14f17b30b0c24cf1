//! Formula preprocessing and reference transformation.
//!
//! Before an arithmetic formula can be evaluated by Rhai, spreadsheet syntax
//! must be turned into a plain expression. This module handles:
//!
//! - **Preprocessing**: `SUM(A1:B5)` → `SUM_RANGE(0, 0, 1, 4)` (col/row),
//!   remaining references → numeric literals, `^` → `**`, and every number
//!   literal written as a float so `7/2` is `3.5`.
//! - **Reference shifting**: adjusting references when rows/columns are
//!   inserted or deleted.
//! - **Reference offsetting**: moving relative references by a fixed delta
//!   when a formula is pasted elsewhere.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use super::cell_ref::{CellRef, column_index};
use super::deps::{at_token_start, cell_token_re, map_outside_strings};
use super::format::REF;

/// Operation for shifting cell references in formulas (0-based coordinates).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftOperation {
    InsertRow(usize),
    DeleteRow(usize),
    InsertColumn(usize),
    DeleteColumn(usize),
}

/// One reference token as written, anchors included.
struct RefToken {
    col_abs: bool,
    row_abs: bool,
    cell: CellRef,
}

impl RefToken {
    fn from_caps(caps: &Captures) -> Option<RefToken> {
        let col = column_index(&caps["col"]).ok()?.checked_sub(1)?;
        let row = caps["row"].parse::<usize>().ok()?.checked_sub(1)?;
        Some(RefToken {
            col_abs: !caps["cabs"].is_empty(),
            row_abs: !caps["rabs"].is_empty(),
            cell: CellRef::new(col, row),
        })
    }

    fn render(&self, cell: &CellRef) -> String {
        format!(
            "{}{}{}{}",
            if self.col_abs { "$" } else { "" },
            cell.column_label(),
            if self.row_abs { "$" } else { "" },
            cell.row + 1
        )
    }
}

/// Rewrite every whole reference token outside string literals.
/// `f` returns the replacement text for a parsed token.
fn rewrite_refs<F>(formula: &str, f: F) -> String
where
    F: Fn(&RefToken) -> String,
{
    map_outside_strings(formula, |seg| {
        cell_token_re()
            .replace_all(seg, |caps: &Captures| {
                let whole = caps.get(0).expect("group 0 always present");
                if !at_token_start(seg, whole.start()) {
                    return whole.as_str().to_string();
                }
                match RefToken::from_caps(caps) {
                    Some(token) => f(&token),
                    None => whole.as_str().to_string(),
                }
            })
            .to_string()
    })
}

impl ShiftOperation {
    /// Where `cell` lands after this operation; `None` if it is deleted.
    pub fn apply(self, cell: &CellRef) -> Option<CellRef> {
        match self {
            ShiftOperation::InsertRow(at) if cell.row >= at => {
                Some(CellRef::new(cell.col, cell.row + 1))
            }
            ShiftOperation::InsertColumn(at) if cell.col >= at => {
                Some(CellRef::new(cell.col + 1, cell.row))
            }
            ShiftOperation::DeleteRow(at) if cell.row == at => None,
            ShiftOperation::DeleteRow(at) if cell.row > at => {
                Some(CellRef::new(cell.col, cell.row - 1))
            }
            ShiftOperation::DeleteColumn(at) if cell.col == at => None,
            ShiftOperation::DeleteColumn(at) if cell.col > at => {
                Some(CellRef::new(cell.col - 1, cell.row))
            }
            _ => Some(cell.clone()),
        }
    }
}

/// Shift cell references in a formula when rows/cols are inserted/deleted.
/// Returns the updated formula string.
///
/// Rules:
/// - Insert row at R: refs to row >= R become row + 1
/// - Delete row at R: refs to row > R become row - 1; row == R becomes `#REF!`
/// - Same logic for columns
/// - Anchors (`$`) are kept and do not prevent the shift
pub fn shift_formula_references(formula: &str, op: ShiftOperation) -> String {
    rewrite_refs(formula, |token| match op.apply(&token.cell) {
        Some(cell) => token.render(&cell),
        None => REF.to_string(),
    })
}

/// Offset all relative cell references in a formula by a column/row delta.
/// Used by paste so pasted formulas keep pointing at the same relative cells.
///
/// Rules:
/// - `A1` offset by (+1, +2) becomes `B3`
/// - `$A1` offset by (+1, +2) becomes `$A3` (anchored parts stay)
/// - refs that move out of bounds become `#REF!`
pub fn offset_formula_references(formula: &str, delta_col: isize, delta_row: isize) -> String {
    if delta_col == 0 && delta_row == 0 {
        return formula.to_string();
    }

    rewrite_refs(formula, |token| {
        let col = if token.col_abs {
            Some(token.cell.col)
        } else {
            token.cell.col.checked_add_signed(delta_col)
        };
        let row = if token.row_abs {
            Some(token.cell.row)
        } else {
            token.cell.row.checked_add_signed(delta_row)
        };
        match (col, row) {
            (Some(col), Some(row)) => token.render(&CellRef::new(col, row)),
            _ => REF.to_string(),
        }
    })
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[0-9]*\.?[0-9]+(?:[eE][+-]?[0-9]+)?").expect("number regex must compile")
    })
}

/// Render `n` as a Rhai float literal (always with a decimal point).
pub(crate) fn float_literal(n: f64) -> String {
    let text = format!("{:?}", n);
    let text = match text.find('e') {
        Some(pos) if !text[..pos].contains('.') => format!("{}.0{}", &text[..pos], &text[pos..]),
        _ => text,
    };
    if n < 0.0 { format!("({})", text) } else { text }
}

fn floats_only(seg: &str) -> String {
    number_re()
        .replace_all(seg, |caps: &Captures| {
            let whole = caps.get(0).expect("group 0 always present");
            if !at_token_start(seg, whole.start()) {
                return whole.as_str().to_string();
            }
            match whole.as_str().parse::<f64>() {
                Ok(n) => float_literal(n),
                Err(_) => whole.as_str().to_string(),
            }
        })
        .to_string()
}

fn rewrite_aggregates(seg: &str) -> String {
    crate::builtins::range_fn_re()
        .replace_all(seg, |caps: &Captures| {
            let Some(rhai_name) = crate::builtins::range_rhai_name(&caps[1]) else {
                return caps[0].to_string();
            };
            let start = CellRef::parse(&caps[2]);
            let end = caps.get(3).map_or_else(|| start.clone(), |m| CellRef::parse(m.as_str()));
            match (start, end) {
                (Ok(start), Ok(end)) => format!(
                    "{}({}, {}, {}, {})",
                    rhai_name, start.col, start.row, end.col, end.row
                ),
                _ => caps[0].to_string(),
            }
        })
        .to_string()
}

/// Turn a formula body (without the leading `=`) into a Rhai expression.
///
/// `value_of` supplies the numeric value substituted for each remaining
/// single reference.
pub fn preprocess_formula<F>(body: &str, value_of: F) -> String
where
    F: Fn(&CellRef) -> f64,
{
    let with_floats = map_outside_strings(body, floats_only);
    let with_ranges = map_outside_strings(&with_floats, rewrite_aggregates);
    let with_values = rewrite_refs(&with_ranges, |token| float_literal(value_of(&token.cell)));
    map_outside_strings(&with_values, |seg| seg.replace('^', "**"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_shift_operation_apply() {
        let b3 = CellRef::new(1, 2);
        assert_eq!(ShiftOperation::InsertRow(2).apply(&b3), Some(CellRef::new(1, 3)));
        assert_eq!(ShiftOperation::InsertRow(3).apply(&b3), Some(b3.clone()));
        assert_eq!(ShiftOperation::DeleteRow(2).apply(&b3), None);
        assert_eq!(ShiftOperation::DeleteRow(0).apply(&b3), Some(CellRef::new(1, 1)));
        assert_eq!(ShiftOperation::InsertColumn(0).apply(&b3), Some(CellRef::new(2, 2)));
        assert_eq!(ShiftOperation::DeleteColumn(1).apply(&b3), None);
        assert_eq!(ShiftOperation::DeleteColumn(2).apply(&b3), Some(b3.clone()));
    }

    #[test]
    fn test_shift_formula_references_range_and_cell() {
        let formula = "=SUM(A1:A3) + B1";
        let shifted = shift_formula_references(formula, ShiftOperation::InsertColumn(0));
        assert_eq!(shifted, "=SUM(B1:B3) + C1");
    }

    #[test]
    fn test_shift_formula_references_rows() {
        let formula = "=A1 + A5 + $A$9";
        let shifted = shift_formula_references(formula, ShiftOperation::InsertRow(4));
        assert_eq!(shifted, "=A1 + A6 + $A$10");
    }

    #[test]
    fn test_shift_formula_references_delete_marks_ref() {
        let formula = "=A1 + A2 + A3";
        let shifted = shift_formula_references(formula, ShiftOperation::DeleteRow(1));
        assert_eq!(shifted, "=A1 + #REF! + A2");
    }

    #[test]
    fn test_shift_leaves_strings_and_functions_alone() {
        let formula = r#"=log10(B2) + "B2""#;
        let shifted = shift_formula_references(formula, ShiftOperation::DeleteColumn(0));
        assert_eq!(shifted, r#"=log10(A2) + "B2""#);
    }

    #[test]
    fn test_offset_formula_references_positive_delta() {
        let formula = "=SUM(A1:B2) + C3 + $D$4";
        let shifted = offset_formula_references(formula, 1, 2);
        assert_eq!(shifted, "=SUM(B3:C4) + D5 + $D$4");
    }

    #[test]
    fn test_offset_formula_references_mixed_anchor() {
        assert_eq!(offset_formula_references("=$A1 + B$1", 2, 3), "=$A4 + D$1");
    }

    #[test]
    fn test_offset_formula_references_out_of_bounds() {
        let shifted = offset_formula_references("=A1 + B2", -1, 0);
        assert_eq!(shifted, "=#REF! + A2");
    }

    #[test]
    fn test_float_literal() {
        assert_eq!(float_literal(5.0), "5.0");
        assert_eq!(float_literal(0.25), "0.25");
        assert_eq!(float_literal(-3.0), "(-3.0)");
        assert_eq!(float_literal(1e21), "1.0e21");
    }

    #[test]
    fn test_preprocess_substitutes_values() {
        let out = preprocess_formula("A1 + B2 * 2", |cell| (cell.col * 10 + cell.row) as f64);
        assert_eq!(out, "0.0 + 11.0 * 2.0");
    }

    #[test]
    fn test_preprocess_rewrites_aggregates_and_power() {
        let out = preprocess_formula("SUM(A1:A3) * 2 ^ 3 + MAX($B$2)", |_| 0.0);
        assert_eq!(out, "SUM_RANGE(0, 0, 0, 2) * 2.0 ** 3.0 + MAX_RANGE(1, 1, 1, 1)");
    }

    #[test]
    fn test_preprocess_keeps_function_names() {
        let out = preprocess_formula("sqrt(A1) + log10(100)", |_| 16.0);
        assert_eq!(out, "sqrt(16.0) + log10(100.0)");
    }

    #[test]
    fn test_preprocess_negative_values_are_parenthesized() {
        let out = preprocess_formula("A1-A2", |cell| if cell.row == 0 { -5.0 } else { -3.0 });
        assert_eq!(out, "(-5.0)-(-3.0)");
    }
}
