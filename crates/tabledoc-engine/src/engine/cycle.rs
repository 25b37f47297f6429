//! Circular dependency detection for formula cells.
//!
//! Evaluating a formula recursively evaluates the formulas it references, so
//! a cycle (A1 → B1 → A1) must be caught before evaluation starts. Depth-first
//! search over the `depends_on` edges of the workbook grid.

use std::collections::HashSet;

use super::{CellRef, Grid};

/// Detect circular dependencies reachable from a cell.
/// Returns the path `start .. start` when a cycle exists.
pub fn detect_cycle(start: &CellRef, grid: &Grid) -> Option<Vec<CellRef>> {
    let deps = grid.get(start).map(|cell| cell.depends_on.clone())?;
    detect_cycle_from(start, &deps, grid)
}

/// Search from a formula at `origin` that reads `deps`.
fn detect_cycle_from(origin: &CellRef, deps: &[CellRef], grid: &Grid) -> Option<Vec<CellRef>> {
    let mut search = CycleSearch {
        grid,
        on_path: HashSet::from([*origin]),
        cleared: HashSet::new(),
        path: vec![*origin],
    };
    deps.iter()
        .any(|dep| search.reaches_path(*dep))
        .then_some(search.path)
}

struct CycleSearch<'a> {
    grid: &'a Grid,
    /// Cells on the current walk; reaching one again closes a cycle.
    on_path: HashSet<CellRef>,
    /// Cells whose whole dependency tree is known to be acyclic.
    cleared: HashSet<CellRef>,
    path: Vec<CellRef>,
}

impl CycleSearch<'_> {
    fn reaches_path(&mut self, cell: CellRef) -> bool {
        if self.on_path.contains(&cell) {
            self.path.push(cell);
            return true;
        }
        if self.cleared.contains(&cell) {
            return false;
        }
        let Some(deps) = self.grid.get(&cell).map(|entry| entry.depends_on.clone()) else {
            return false;
        };

        self.on_path.insert(cell);
        self.path.push(cell);
        if deps.into_iter().any(|dep| self.reaches_path(dep)) {
            return true;
        }
        self.path.pop();
        self.on_path.remove(&cell);
        self.cleared.insert(cell);
        false
    }
}
