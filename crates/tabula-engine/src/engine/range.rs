//! Rectangular cell ranges.
//!
//! A range is written either as a single address (`B2`) or as two corners
//! separated by `:` (`A1:C3`, `C3:A1`). Corners are normalized so iteration
//! always runs from the top-left to the bottom-right corner, column-major:
//! every row of the first column, then every row of the next column.

use super::cell_ref::{AddressError, CellRef};

/// An inclusive rectangle of cells with normalized corners.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl CellRange {
    /// Build a range from two corners in any order.
    pub fn new(a: CellRef, b: CellRef) -> CellRange {
        CellRange {
            start: CellRef::new(a.col.min(b.col), a.row.min(b.row)),
            end: CellRef::new(a.col.max(b.col), a.row.max(b.row)),
        }
    }

    /// Parse `"A1:B2"` or a single `"A1"`.
    pub fn parse(text: &str) -> Result<CellRange, AddressError> {
        match text.split_once(':') {
            Some((a, b)) => Ok(CellRange::new(
                CellRef::parse(a.trim())?,
                CellRef::parse(b.trim())?,
            )),
            None => {
                let single = CellRef::parse(text.trim())?;
                Ok(CellRange::new(single.clone(), single))
            }
        }
    }

    pub fn width(&self) -> usize {
        self.end.col - self.start.col + 1
    }

    pub fn height(&self) -> usize {
        self.end.row - self.start.row + 1
    }

    /// Number of cells, or `None` if it does not fit in a `usize`.
    pub fn cell_count(&self) -> Option<usize> {
        self.width().checked_mul(self.height())
    }

    pub fn contains(&self, cell: &CellRef) -> bool {
        (self.start.col..=self.end.col).contains(&cell.col)
            && (self.start.row..=self.end.row).contains(&cell.row)
    }

    /// Iterate the cells column-major without materializing them.
    pub fn iter(&self) -> impl Iterator<Item = CellRef> + '_ {
        (self.start.col..=self.end.col)
            .flat_map(move |col| (self.start.row..=self.end.row).map(move |row| CellRef::new(col, row)))
    }
}

/// Expand a range expression into every address it covers, column-major.
pub fn expand_range(text: &str) -> Result<Vec<CellRef>, AddressError> {
    let range = CellRange::parse(text)?;
    Ok(range.iter().collect())
}
