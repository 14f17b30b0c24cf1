use super::{CellUpdate, Clipboard, Document};
use crate::error::{Result, TabulaError};
use std::slice;
use tabula_engine::engine::{
    AddressError, Cell, CellRange, CellRef, ShiftOperation, classify, column_index,
    offset_formula_references, recalculate_all, recalculate_cells, shift_formula_references,
};

impl Document {
    /// Commit user input to a cell and recompute everything that depends on it.
    ///
    /// Formula input is stored with its leading `=` and evaluated. Literal
    /// input is checked against the cell's declared type; a rejection leaves
    /// the grid untouched and carries the reason. Returns the recomputed
    /// cells in evaluation order.
    pub fn commit_edit(
        &mut self,
        cell_ref: &CellRef,
        raw: &str,
        is_formula: bool,
    ) -> Result<Vec<CellRef>> {
        let mut cell = self.cell(cell_ref);
        if is_formula {
            let formula = if raw.starts_with('=') {
                raw.to_string()
            } else {
                format!("={}", raw)
            };
            cell.set_formula(&formula);
        } else {
            let kind = match classify(raw, cell.data_type) {
                Ok(kind) => kind,
                Err(reason) => {
                    log::debug!("{} rejected {:?}: {}", cell_ref, raw, reason);
                    return Err(TabulaError::Rejected(reason));
                }
            };
            cell.set_literal(raw, kind, &self.config.date_format);
        }

        self.grid.insert(cell_ref.clone(), cell);
        self.modified = true;

        let recomputed = recalculate_cells(slice::from_ref(cell_ref), &self.evaluator);
        log::debug!("committed {}, recomputed {} cell(s)", cell_ref, recomputed.len());
        Ok(recomputed)
    }

    /// Change a cell's declared type or one style field. Nothing is
    /// recomputed and the stored value is not re-validated.
    pub fn update_cell(&mut self, cell_ref: &CellRef, update: CellUpdate) {
        {
            let mut cell = self.grid.entry(cell_ref.clone()).or_default();
            match update {
                CellUpdate::DataType(data_type) => cell.data_type = data_type,
                CellUpdate::Style(style) => cell.style.apply(style),
            }
        }
        self.modified = true;
    }

    /// Drop a cell's content (keeping style and declared type), returning
    /// whether there was a cell to clear.
    fn clear_content_at(&self, cell_ref: &CellRef) -> bool {
        let now_default = match self.grid.get_mut(cell_ref) {
            Some(mut cell) => {
                cell.clear_content();
                cell.is_default()
            }
            None => return false,
        };
        if now_default {
            self.grid.remove(cell_ref);
        }
        true
    }

    /// Clear the specified cell's content and recompute its dependents.
    pub fn clear_cell(&mut self, cell_ref: &CellRef) -> Vec<CellRef> {
        if !self.clear_content_at(cell_ref) {
            return Vec::new();
        }
        self.modified = true;
        recalculate_cells(slice::from_ref(cell_ref), &self.evaluator)
    }

    /// Move a whole cell (content, type and style) to `to`; `from` becomes
    /// an empty default cell. Formula text moves unchanged.
    pub fn move_cell(&mut self, from: &CellRef, to: &CellRef) -> Vec<CellRef> {
        if from == to {
            return Vec::new();
        }
        let moved = self
            .grid
            .remove(from)
            .map(|(_, cell)| cell)
            .unwrap_or_default();
        if moved.is_default() {
            self.grid.remove(to);
        } else {
            self.grid.insert(to.clone(), moved);
        }
        self.modified = true;
        log::debug!("moved {} to {}", from, to);
        recalculate_cells(&[from.clone(), to.clone()], &self.evaluator)
    }

    /// Copy the cells of `range` to the clipboard.
    pub fn copy(&mut self, range: &CellRange) {
        let origin = range.start.clone();
        let mut cells: Vec<(usize, usize, Cell)> = self
            .grid
            .iter()
            .filter(|entry| range.contains(entry.key()))
            .map(|entry| {
                let key = entry.key();
                (key.col - origin.col, key.row - origin.row, entry.value().clone())
            })
            .collect();
        cells.sort_by_key(|(col, row, _)| (*col, *row));
        self.clipboard = Some(Clipboard { origin, cells });
    }

    /// Copy `range` to the clipboard, then clear the copied cells.
    pub fn cut(&mut self, range: &CellRange) -> Vec<CellRef> {
        self.copy(range);
        let cleared: Vec<CellRef> = match &self.clipboard {
            Some(clip) => clip
                .cells
                .iter()
                .map(|(col, row, _)| CellRef::new(clip.origin.col + col, clip.origin.row + row))
                .collect(),
            None => Vec::new(),
        };
        if cleared.is_empty() {
            return Vec::new();
        }
        for cell_ref in &cleared {
            self.clear_content_at(cell_ref);
        }
        self.modified = true;
        recalculate_cells(&cleared, &self.evaluator)
    }

    /// Paste the clipboard with its top-left corner at `target`.
    ///
    /// Content is pasted onto the target cells, which keep their own style
    /// and declared type. Relative references in pasted formulas move by the
    /// paste distance; `$`-anchored parts stay. Returns the recomputed cells.
    pub fn paste(&mut self, target: &CellRef) -> Result<Vec<CellRef>> {
        let clip = self.clipboard.clone().ok_or(TabulaError::EmptyClipboard)?;
        let delta_col = target.col as isize - clip.origin.col as isize;
        let delta_row = target.row as isize - clip.origin.row as isize;

        let mut pasted = Vec::with_capacity(clip.cells.len());
        for (col, row, source) in clip.cells {
            let dest = CellRef::new(target.col + col, target.row + row);
            let mut cell = self.cell(&dest);
            if source.is_formula() {
                let shifted = offset_formula_references(&source.formula, delta_col, delta_row);
                cell.set_formula(&shifted);
            } else {
                cell.set_literal(&source.raw_value, source.kind, &self.config.date_format);
            }
            self.grid.insert(dest.clone(), cell);
            pasted.push(dest);
        }

        self.modified = true;
        Ok(recalculate_cells(&pasted, &self.evaluator))
    }

    /// Re-key every cell affected by a row/column insert or delete in one
    /// pass. Formula text is rewritten only when `rewrite_references` is
    /// enabled, in which case the whole grid is recalculated.
    fn restructure(&mut self, op: ShiftOperation) -> Vec<CellRef> {
        let rewrite = self.config.rewrite_references;
        let entries: Vec<(CellRef, Cell)> = self
            .grid
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let mut rekeyed = Vec::with_capacity(entries.len());
        let mut dropped = 0usize;
        for (cell_ref, mut cell) in entries {
            let Some(new_ref) = op.apply(&cell_ref) else {
                dropped += 1;
                continue;
            };
            if rewrite && cell.is_formula() {
                let shifted = shift_formula_references(&cell.formula, op);
                if shifted != cell.formula {
                    cell.set_formula(&shifted);
                }
            }
            rekeyed.push((new_ref, cell));
        }

        self.grid.clear();
        for (cell_ref, cell) in rekeyed {
            self.grid.insert(cell_ref, cell);
        }
        self.modified = true;
        log::debug!("{:?}: {} cell(s) kept, {} dropped", op, self.grid.len(), dropped);

        if rewrite {
            recalculate_all(&self.evaluator)
        } else {
            Vec::new()
        }
    }

    /// Insert an empty row below 1-based row `row` (0 inserts above row 1).
    pub fn insert_row_after(&mut self, row: usize) -> Vec<CellRef> {
        self.restructure(ShiftOperation::InsertRow(row))
    }

    /// Delete 1-based row `row`; rows below move up by one.
    pub fn delete_row(&mut self, row: usize) -> Result<Vec<CellRef>> {
        if row == 0 {
            return Err(AddressError::ZeroRow(row.to_string()).into());
        }
        Ok(self.restructure(ShiftOperation::DeleteRow(row - 1)))
    }

    /// Insert an empty column to the right of column `label`.
    pub fn insert_column_after(&mut self, label: &str) -> Result<Vec<CellRef>> {
        let index = column_index(label)?;
        Ok(self.restructure(ShiftOperation::InsertColumn(index)))
    }

    /// Delete column `label`; columns to its right move left by one.
    pub fn delete_column(&mut self, label: &str) -> Result<Vec<CellRef>> {
        let index = column_index(label)?;
        Ok(self.restructure(ShiftOperation::DeleteColumn(index - 1)))
    }
}

#[cfg(test)]
mod tests {
    use super::Document;
    use crate::config::Config;
    use crate::document::CellUpdate;
    use crate::error::TabulaError;
    use pretty_assertions::assert_eq;
    use tabula_engine::engine::{
        Alignment, CellRange, CellRef, DataType, StyleUpdate, ValueKind,
    };

    fn at(addr: &str) -> CellRef {
        CellRef::parse(addr).unwrap()
    }

    fn labels(cells: &[CellRef]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_commit_literal_and_formula() {
        let mut doc = Document::new();
        doc.commit_edit(&at("A1"), "5", false).unwrap();
        doc.commit_edit(&at("A2"), "10", false).unwrap();
        let recomputed = doc.commit_edit(&at("A3"), "=SUM(A1:A2)", true).unwrap();
        assert_eq!(labels(&recomputed), vec!["A3"]);
        assert_eq!(doc.display(&at("A3")), "15");
        assert_eq!(doc.cell(&at("A1")).kind, ValueKind::Number);
        assert!(doc.modified);
    }

    #[test]
    fn test_commit_formula_without_marker() {
        let mut doc = Document::new();
        doc.commit_edit(&at("B1"), "2*3", true).unwrap();
        assert_eq!(doc.cell(&at("B1")).formula, "=2*3");
        assert_eq!(doc.display(&at("B1")), "6");
    }

    #[test]
    fn test_commit_propagates_to_dependents() {
        let mut doc = Document::new();
        doc.commit_edit(&at("A1"), "1", false).unwrap();
        doc.commit_edit(&at("B1"), "=A1*2", true).unwrap();
        doc.commit_edit(&at("C1"), "=B1+A1", true).unwrap();

        let recomputed = doc.commit_edit(&at("A1"), "4", false).unwrap();
        assert_eq!(labels(&recomputed), vec!["B1", "C1"]);
        assert_eq!(doc.display(&at("C1")), "12");
    }

    #[test]
    fn test_literal_replaces_formula() {
        let mut doc = Document::new();
        doc.commit_edit(&at("A1"), "=1+1", true).unwrap();
        doc.commit_edit(&at("A1"), "hello", false).unwrap();
        let cell = doc.cell(&at("A1"));
        assert!(!cell.is_formula());
        assert!(cell.depends_on.is_empty());
        assert_eq!(cell.computed, "hello");
    }

    #[test]
    fn test_rejected_literal_leaves_cell_untouched() {
        let mut doc = Document::new();
        doc.update_cell(&at("A1"), CellUpdate::DataType(DataType::Number));
        doc.commit_edit(&at("A1"), "7", false).unwrap();
        let before = doc.cell(&at("A1"));

        let err = doc.commit_edit(&at("A1"), "abc", false).unwrap_err();
        assert!(matches!(err, TabulaError::Rejected(_)));
        assert_eq!(err.to_string(), "Value must be a number");
        assert_eq!(doc.cell(&at("A1")), before);
    }

    #[test]
    fn test_declared_type_survives_commit() {
        let mut doc = Document::new();
        doc.update_cell(&at("A1"), CellUpdate::DataType(DataType::Date));
        doc.commit_edit(&at("A1"), "March 5, 2024", false).unwrap();
        let cell = doc.cell(&at("A1"));
        assert_eq!(cell.data_type, DataType::Date);
        assert_eq!(cell.kind, ValueKind::Date);
        assert_eq!(cell.computed, "2024-03-05");
        assert_eq!(cell.raw_value, "March 5, 2024");
    }

    #[test]
    fn test_date_format_from_config() {
        let config = Config {
            date_format: "%d/%m/%Y".to_string(),
            ..Config::default()
        };
        let mut doc = Document::with_config(config);
        doc.commit_edit(&at("A1"), "2024-03-05", false).unwrap();
        assert_eq!(doc.display(&at("A1")), "05/03/2024");
    }

    #[test]
    fn test_type_change_does_not_revalidate() {
        let mut doc = Document::new();
        doc.commit_edit(&at("A1"), "abc", false).unwrap();
        doc.update_cell(&at("A1"), CellUpdate::DataType(DataType::Number));
        assert_eq!(doc.display(&at("A1")), "abc");
    }

    #[test]
    fn test_style_update_does_not_recompute() {
        let mut doc = Document::new();
        doc.commit_edit(&at("A1"), "3", false).unwrap();
        doc.update_cell(&at("A1"), CellUpdate::Style(StyleUpdate::Bold(true)));
        doc.update_cell(&at("A1"), CellUpdate::Style(StyleUpdate::Align(Alignment::Right)));
        doc.update_cell(&at("B9"), CellUpdate::Style(StyleUpdate::FontSize(20)));

        let a1 = doc.cell(&at("A1"));
        assert!(a1.style.bold);
        assert_eq!(a1.style.align, Alignment::Right);
        assert_eq!(a1.computed, "3");
        assert_eq!(doc.cell(&at("B9")).style.font_size, 20);
    }

    #[test]
    fn test_cycle_on_commit() {
        let mut doc = Document::new();
        doc.commit_edit(&at("A1"), "=B1+1", true).unwrap();
        doc.commit_edit(&at("B1"), "=A1+1", true).unwrap();
        assert_eq!(doc.display(&at("A1")), "#CYCLE!");
        assert_eq!(doc.display(&at("B1")), "#CYCLE!");

        // Breaking the cycle recovers both cells.
        doc.commit_edit(&at("B1"), "5", false).unwrap();
        assert_eq!(doc.display(&at("A1")), "6");
    }

    #[test]
    fn test_clear_cell_keeps_style_and_propagates() {
        let mut doc = Document::new();
        doc.commit_edit(&at("A1"), "4", false).unwrap();
        doc.update_cell(&at("A1"), CellUpdate::Style(StyleUpdate::Italic(true)));
        doc.commit_edit(&at("B1"), "=A1+1", true).unwrap();

        let recomputed = doc.clear_cell(&at("A1"));
        assert_eq!(labels(&recomputed), vec!["B1"]);
        assert_eq!(doc.display(&at("B1")), "1");
        let a1 = doc.cell(&at("A1"));
        assert!(a1.style.italic);
        assert_eq!(a1.raw_value, "");

        assert!(doc.clear_cell(&at("Z99")).is_empty());
    }

    #[test]
    fn test_clear_plain_cell_removes_it() {
        let mut doc = Document::new();
        doc.commit_edit(&at("A1"), "4", false).unwrap();
        doc.clear_cell(&at("A1"));
        assert!(doc.grid.get(&at("A1")).is_none());
    }

    #[test]
    fn test_move_cell_resets_source() {
        let mut doc = Document::new();
        doc.commit_edit(&at("A1"), "9", false).unwrap();
        doc.update_cell(&at("A1"), CellUpdate::Style(StyleUpdate::Underline(true)));
        doc.commit_edit(&at("B1"), "=A1*2", true).unwrap();

        doc.move_cell(&at("A1"), &at("C3"));
        assert!(doc.grid.get(&at("A1")).is_none());
        let c3 = doc.cell(&at("C3"));
        assert_eq!(c3.computed, "9");
        assert!(c3.style.underline);
        // B1 still reads A1, which is now empty.
        assert_eq!(doc.display(&at("B1")), "0");
    }

    #[test]
    fn test_copy_paste_offsets_relative_references() {
        let mut doc = Document::new();
        doc.commit_edit(&at("A1"), "2", false).unwrap();
        doc.commit_edit(&at("A2"), "3", false).unwrap();
        doc.commit_edit(&at("B1"), "=A1*10", true).unwrap();
        doc.commit_edit(&at("C1"), "=$A$1+1", true).unwrap();

        doc.copy(&CellRange::parse("B1:C1").unwrap());
        doc.paste(&at("B2")).unwrap();
        assert_eq!(doc.cell(&at("B2")).formula, "=A2*10");
        assert_eq!(doc.display(&at("B2")), "30");
        assert_eq!(doc.cell(&at("C2")).formula, "=$A$1+1");
        assert_eq!(doc.display(&at("C2")), "3");
        // Source untouched.
        assert_eq!(doc.display(&at("B1")), "20");
    }

    #[test]
    fn test_paste_keeps_target_style() {
        let mut doc = Document::new();
        doc.commit_edit(&at("A1"), "hello", false).unwrap();
        doc.update_cell(&at("D4"), CellUpdate::Style(StyleUpdate::TextColor("red".into())));
        doc.copy(&CellRange::parse("A1").unwrap());
        doc.paste(&at("D4")).unwrap();
        let d4 = doc.cell(&at("D4"));
        assert_eq!(d4.computed, "hello");
        assert_eq!(d4.style.text_color, "red");
    }

    #[test]
    fn test_paste_out_of_bounds_reference_is_ref() {
        let mut doc = Document::new();
        doc.commit_edit(&at("B2"), "=A1+1", true).unwrap();
        doc.copy(&CellRange::parse("B2").unwrap());
        doc.paste(&at("A1")).unwrap();
        assert_eq!(doc.cell(&at("A1")).formula, "=#REF!+1");
        assert_eq!(doc.display(&at("A1")), "#REF!");
    }

    #[test]
    fn test_cut_then_paste_moves_content() {
        let mut doc = Document::new();
        doc.commit_edit(&at("A1"), "8", false).unwrap();
        doc.commit_edit(&at("B1"), "=A1", true).unwrap();

        let recomputed = doc.cut(&CellRange::parse("A1").unwrap());
        assert_eq!(labels(&recomputed), vec!["B1"]);
        assert_eq!(doc.display(&at("B1")), "0");

        doc.paste(&at("A1")).unwrap();
        assert_eq!(doc.display(&at("B1")), "8");
    }

    #[test]
    fn test_paste_without_clipboard_is_error() {
        let mut doc = Document::new();
        assert!(matches!(
            doc.paste(&at("A1")),
            Err(TabulaError::EmptyClipboard)
        ));
    }

    #[test]
    fn test_insert_row_rekeys_without_rewriting() {
        let mut doc = Document::new();
        doc.commit_edit(&at("A1"), "1", false).unwrap();
        doc.commit_edit(&at("A2"), "2", false).unwrap();
        doc.commit_edit(&at("B3"), "=A2", true).unwrap();

        doc.insert_row_after(1);
        assert_eq!(doc.display(&at("A1")), "1");
        assert!(doc.grid.get(&at("A2")).is_none());
        assert_eq!(doc.display(&at("A3")), "2");
        assert_eq!(doc.cell(&at("B4")).formula, "=A2");
    }

    #[test]
    fn test_insert_row_with_reference_rewriting() {
        let config = Config {
            rewrite_references: true,
            ..Config::default()
        };
        let mut doc = Document::with_config(config);
        doc.commit_edit(&at("A1"), "1", false).unwrap();
        doc.commit_edit(&at("A2"), "2", false).unwrap();
        doc.commit_edit(&at("B3"), "=A1+A2", true).unwrap();

        doc.insert_row_after(1);
        assert_eq!(doc.cell(&at("B4")).formula, "=A1+A3");
        assert_eq!(doc.display(&at("B4")), "3");
    }

    #[test]
    fn test_delete_row_with_reference_rewriting_marks_ref() {
        let config = Config {
            rewrite_references: true,
            ..Config::default()
        };
        let mut doc = Document::with_config(config);
        doc.commit_edit(&at("A1"), "1", false).unwrap();
        doc.commit_edit(&at("A2"), "2", false).unwrap();
        doc.commit_edit(&at("A3"), "3", false).unwrap();
        doc.commit_edit(&at("B1"), "=A2*A3", true).unwrap();

        doc.delete_row(2).unwrap();
        assert_eq!(doc.cell(&at("B1")).formula, "=#REF!*A2");
        assert_eq!(doc.display(&at("B1")), "#REF!");
        assert_eq!(doc.display(&at("A2")), "3");
    }

    #[test]
    fn test_delete_row_zero_is_error() {
        let mut doc = Document::new();
        assert!(matches!(doc.delete_row(0), Err(TabulaError::Address(_))));
    }

    #[test]
    fn test_insert_and_delete_column() {
        let mut doc = Document::new();
        doc.commit_edit(&at("A1"), "a", false).unwrap();
        doc.commit_edit(&at("B1"), "b", false).unwrap();
        doc.commit_edit(&at("C1"), "c", false).unwrap();

        doc.insert_column_after("A").unwrap();
        assert_eq!(doc.display(&at("A1")), "a");
        assert!(doc.grid.get(&at("B1")).is_none());
        assert_eq!(doc.display(&at("C1")), "b");
        assert_eq!(doc.display(&at("D1")), "c");

        doc.delete_column("C").unwrap();
        assert_eq!(doc.display(&at("C1")), "c");
        assert!(doc.grid.get(&at("D1")).is_none());
        assert_eq!(doc.grid.len(), 2);

        assert!(doc.delete_column("1").is_err());
    }
}
