//! Dependency extraction from formula strings.
//!
//! Finds every cell a formula reads (`A1`, `@B2`, `SUM(A1:C5)`) so the
//! workbook can invalidate cached results and detect cycles.

use super::cell_ref::CellRef;
use super::preprocess::{cell_token_re, map_outside_strings};
use crate::builtins::range_fn_re;

/// Larger ranges are not expanded here; the cells they read are recorded
/// when the formula is evaluated (see [`ReadTracker`](super::ReadTracker)).
const MAX_DEPENDENCY_RANGE_CELLS: usize = 1_000_000;

/// Extract all cell references from a formula body as dependencies.
pub fn extract_dependencies(formula: &str) -> Vec<CellRef> {
    let mut deps = Vec::new();

    // Ignore references inside string literals.
    let mut outside = String::with_capacity(formula.len());
    map_outside_strings(formula, |segment| {
        outside.push_str(segment);
        outside.push(' ');
        String::new()
    });
    let formula = outside;

    let range_re = range_fn_re();
    for caps in range_re.captures_iter(&formula) {
        let (Some(start), Some(end)) = (CellRef::parse(&caps[2]), CellRef::parse(&caps[3])) else {
            continue;
        };
        let min_row = start.row.min(end.row);
        let max_row = start.row.max(end.row);
        let min_col = start.col.min(end.col);
        let max_col = start.col.max(end.col);

        let Some(cell_count) = (max_row - min_row + 1).checked_mul(max_col - min_col + 1) else {
            continue;
        };
        if cell_count > MAX_DEPENDENCY_RANGE_CELLS {
            continue;
        }

        for row in min_row..=max_row {
            for col in min_col..=max_col {
                deps.push(CellRef::new(row, col));
            }
        }
    }

    // Remove range calls so their corners are not counted twice.
    let without_ranges = range_re.replace_all(&formula, "");
    for caps in cell_token_re().captures_iter(&without_ranges) {
        if let Some(cell) = CellRef::parse(&caps[1]) {
            deps.push(cell);
        }
    }

    deps
}
