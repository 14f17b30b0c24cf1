//! Change propagation through dependent formulas.
//!
//! After a cell changes, every formula that (transitively) references it is
//! recomputed. Dependents are ordered topologically, so each formula is
//! evaluated once, after everything it reads. Cells that sit on a reference
//! cycle cannot be ordered; they receive the `#CYCLE!` sentinel and the
//! cells downstream of them are then evaluated against that value.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::cycle::find_cycle_with;
use super::eval::Evaluator;
use super::format::CYCLE;
use super::{CellRef, Grid};

/// Reverse dependency map: cell -> formula cells that reference it.
pub type Dependents = HashMap<CellRef, BTreeSet<CellRef>>;

/// Build the reverse dependency map from the grid's formulas.
pub fn build_dependents(grid: &Grid) -> Dependents {
    let mut dependents: Dependents = HashMap::new();
    for entry in grid.iter() {
        for dep in &entry.value().depends_on {
            dependents
                .entry(dep.clone())
                .or_default()
                .insert(entry.key().clone());
        }
    }
    dependents
}

/// Every formula cell that depends on `changed`, directly or transitively.
/// Includes `changed` itself only if it reaches itself through a cycle.
pub fn collect_dependents(changed: &CellRef, dependents: &Dependents) -> BTreeSet<CellRef> {
    let mut affected = BTreeSet::new();
    let mut stack = vec![changed.clone()];
    while let Some(cell) = stack.pop() {
        if let Some(direct) = dependents.get(&cell) {
            for dep in direct {
                if affected.insert(dep.clone()) {
                    stack.push(dep.clone());
                }
            }
        }
    }
    affected
}

/// Recompute every cell depending on `changed`, in dependency order.
/// Returns the cells that were recomputed, in evaluation order.
pub fn propagate(changed: &CellRef, evaluator: &Evaluator) -> Vec<CellRef> {
    let grid = evaluator.grid();
    let dependents = build_dependents(grid);
    let affected = collect_dependents(changed, &dependents);
    if affected.is_empty() {
        return Vec::new();
    }
    log::debug!("{} changed, recomputing {} dependent cell(s)", changed, affected.len());
    recalculate(affected, &dependents, evaluator)
}

/// Recompute the formula cells among `changed` together with everything
/// that depends on any of them, in dependency order.
pub fn recalculate_cells(changed: &[CellRef], evaluator: &Evaluator) -> Vec<CellRef> {
    let grid = evaluator.grid();
    let dependents = build_dependents(grid);
    let mut pending = BTreeSet::new();
    for cell in changed {
        if grid.get(cell).is_some_and(|entry| entry.is_formula()) {
            pending.insert(cell.clone());
        }
        pending.extend(collect_dependents(cell, &dependents));
    }
    if pending.is_empty() {
        return Vec::new();
    }
    recalculate(pending, &dependents, evaluator)
}

/// Recompute every formula cell in the grid.
pub fn recalculate_all(evaluator: &Evaluator) -> Vec<CellRef> {
    let grid = evaluator.grid();
    let dependents = build_dependents(grid);
    let formulas: BTreeSet<CellRef> = grid
        .iter()
        .filter(|entry| entry.value().is_formula())
        .map(|entry| entry.key().clone())
        .collect();
    recalculate(formulas, &dependents, evaluator)
}

fn depends_on(grid: &Grid, cell: &CellRef) -> Vec<CellRef> {
    grid.get(cell)
        .map(|entry| entry.depends_on.clone())
        .unwrap_or_default()
}

fn store(grid: &Grid, cell: &CellRef, computed: String) {
    if let Some(mut entry) = grid.get_mut(cell) {
        entry.set_computed(computed);
    }
}

/// Evaluate `pending` cells in topological order; cycle members get `#CYCLE!`.
fn recalculate(
    mut pending: BTreeSet<CellRef>,
    dependents: &Dependents,
    evaluator: &Evaluator,
) -> Vec<CellRef> {
    let grid = evaluator.grid();
    let mut order = Vec::with_capacity(pending.len());

    // Number of unresolved cells each pending cell still waits on.
    let mut waiting: HashMap<CellRef, usize> = pending
        .iter()
        .map(|cell| {
            let unique: HashSet<CellRef> = depends_on(grid, cell).into_iter().collect();
            let n = unique.iter().filter(|dep| pending.contains(*dep)).count();
            (cell.clone(), n)
        })
        .collect();
    let mut ready: BTreeSet<CellRef> = waiting
        .iter()
        .filter(|(_, n)| **n == 0)
        .map(|(cell, _)| cell.clone())
        .collect();

    let resolve = |cell: &CellRef,
                       pending: &mut BTreeSet<CellRef>,
                       waiting: &mut HashMap<CellRef, usize>,
                       ready: &mut BTreeSet<CellRef>| {
        pending.remove(cell);
        for dependent in dependents.get(cell).into_iter().flatten() {
            if !pending.contains(dependent) {
                continue;
            }
            if let Some(n) = waiting.get_mut(dependent) {
                *n = n.saturating_sub(1);
                if *n == 0 {
                    ready.insert(dependent.clone());
                }
            }
        }
    };

    loop {
        while let Some(cell) = ready.pop_first() {
            if !pending.contains(&cell) {
                continue;
            }
            let formula = match grid.get(&cell) {
                Some(entry) => entry.formula.clone(),
                None => String::new(),
            };
            let computed = evaluator.evaluate(&formula);
            store(grid, &cell, computed);
            order.push(cell.clone());
            resolve(&cell, &mut pending, &mut waiting, &mut ready);
        }

        if pending.is_empty() {
            break;
        }

        let cyclic: Vec<CellRef> = pending
            .iter()
            .filter(|cell| {
                find_cycle_with(cell, |c| {
                    depends_on(grid, c)
                        .into_iter()
                        .filter(|d| pending.contains(d))
                        .collect()
                })
                .is_some()
            })
            .cloned()
            .collect();
        if cyclic.is_empty() {
            log::warn!("{} cell(s) could not be ordered", pending.len());
            break;
        }

        log::warn!(
            "reference cycle through {}",
            cyclic.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(", ")
        );
        for cell in &cyclic {
            store(grid, cell, CYCLE.to_string());
            order.push(cell.clone());
        }
        for cell in &cyclic {
            resolve(cell, &mut pending, &mut waiting, &mut ready);
        }
    }

    order
}
