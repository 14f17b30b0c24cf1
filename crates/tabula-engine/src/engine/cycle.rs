//! Circular dependency detection for formula cells.
//!
//! A cycle exists when a formula reaches back to its own cell through its
//! references (A1 references B1, B1 references C1, C1 references A1).
//! The search is an explicit-stack depth-first walk, so long reference
//! chains do not grow the call stack.

use std::collections::HashSet;

use super::CellRef;

/// Find a cycle that passes through `start`, following the edges given by
/// `deps_of`. Returns the cycle path beginning and ending at `start`.
pub fn find_cycle_with<F>(start: &CellRef, deps_of: F) -> Option<Vec<CellRef>>
where
    F: Fn(&CellRef) -> Vec<CellRef>,
{
    let mut visited = HashSet::new();
    // Each frame: the cell and its not-yet-explored dependencies.
    let mut stack: Vec<(CellRef, Vec<CellRef>)> = vec![(start.clone(), deps_of(start))];
    visited.insert(start.clone());

    while let Some((_, pending)) = stack.last_mut() {
        let Some(next) = pending.pop() else {
            stack.pop();
            continue;
        };
        if next == *start {
            let mut path: Vec<CellRef> = stack.iter().map(|(cell, _)| cell.clone()).collect();
            path.push(next);
            return Some(path);
        }
        if visited.insert(next.clone()) {
            let deps = deps_of(&next);
            stack.push((next, deps));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Cell, Grid, ValueKind, new_grid};

    fn detect_cycle(start: &CellRef, grid: &Grid) -> Option<Vec<CellRef>> {
        find_cycle_with(start, |cell| {
            grid.get(cell)
                .map(|entry| entry.depends_on.clone())
                .unwrap_or_default()
        })
    }

    fn formula_grid(cells: &[(&str, &str)]) -> Grid {
        let grid = new_grid();
        for (addr, formula) in cells {
            grid.insert(CellRef::parse(addr).unwrap(), Cell::new_formula(formula));
        }
        grid
    }

    #[test]
    fn test_detect_cycle_no_cycle() {
        let grid = formula_grid(&[("C1", "=A1 + B1")]);
        grid.insert(CellRef::new(0, 0), Cell::new_literal("10", ValueKind::Number, ""));
        assert!(detect_cycle(&CellRef::new(2, 0), &grid).is_none());
    }

    #[test]
    fn test_detect_cycle_direct() {
        let grid = formula_grid(&[("A1", "=B1"), ("B1", "=A1")]);
        assert!(detect_cycle(&CellRef::new(0, 0), &grid).is_some());
        assert!(detect_cycle(&CellRef::new(1, 0), &grid).is_some());
    }

    #[test]
    fn test_detect_cycle_indirect() {
        let grid = formula_grid(&[("A1", "=B1"), ("B1", "=C1"), ("C1", "=A1")]);
        let path = detect_cycle(&CellRef::new(0, 0), &grid).unwrap();
        let labels: Vec<String> = path.iter().map(|c| c.to_string()).collect();
        assert_eq!(labels, vec!["A1", "B1", "C1", "A1"]);
    }

    #[test]
    fn test_detect_cycle_self_reference() {
        let grid = formula_grid(&[("A1", "=A1+1")]);
        assert!(detect_cycle(&CellRef::new(0, 0), &grid).is_some());
    }

    #[test]
    fn test_cycle_downstream_is_not_on_cycle() {
        let grid = formula_grid(&[("A1", "=B1"), ("B1", "=A1"), ("C1", "=A1")]);
        assert!(detect_cycle(&CellRef::new(2, 0), &grid).is_none());
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let grid = new_grid();
        for row in 0..50_000 {
            grid.insert(
                CellRef::new(0, row),
                Cell::new_formula(&format!("=A{}", row + 2)),
            );
        }
        assert!(detect_cycle(&CellRef::new(0, 0), &grid).is_none());
    }
}
