//! Functions registered into every formula engine.
//!
//! `CELL(r, c)` and `VALUE(r, c)` read single cells; `SUM(A1:B5)` and the
//! other [`RangeFn`]s are rewritten by preprocessing into `SUM_RANGE(r1, c1,
//! r2, c2)` calls with normalised corners.

use crate::engine::{
    CellRef, CellType, EngineState, GridBounds, Grid, ReadTracker, ValueCache, preprocess_formula,
};
use regex::Regex;
use rhai::{Dynamic, Engine, EvalAltResult, NativeCallContext, Position};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// Maximum nesting of formula-in-formula evaluation triggered by references.
const MAX_EVAL_DEPTH: usize = 256;

/// Aggregates that take an A1 range, e.g. `SUM(A1:B5)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RangeFn {
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

impl RangeFn {
    pub(crate) const ALL: [RangeFn; 5] = [
        RangeFn::Sum,
        RangeFn::Avg,
        RangeFn::Count,
        RangeFn::Min,
        RangeFn::Max,
    ];

    pub(crate) fn sheet_name(self) -> &'static str {
        match self {
            RangeFn::Sum => "SUM",
            RangeFn::Avg => "AVG",
            RangeFn::Count => "COUNT",
            RangeFn::Min => "MIN",
            RangeFn::Max => "MAX",
        }
    }

    /// Name of the registered function taking `(r1, c1, r2, c2)`.
    pub(crate) fn rhai_name(self) -> &'static str {
        match self {
            RangeFn::Sum => "SUM_RANGE",
            RangeFn::Avg => "AVG_RANGE",
            RangeFn::Count => "COUNT_RANGE",
            RangeFn::Min => "MIN_RANGE",
            RangeFn::Max => "MAX_RANGE",
        }
    }

    pub(crate) fn from_sheet_name(name: &str) -> Option<RangeFn> {
        RangeFn::ALL
            .into_iter()
            .find(|f| f.sheet_name().eq_ignore_ascii_case(name))
    }

    /// Fold the numeric cells of a range. `COUNT_RANGE` counts non-empty
    /// cells through `range_count` instead.
    fn fold(self, values: &[f64]) -> f64 {
        match self {
            RangeFn::Sum => values.iter().sum(),
            RangeFn::Avg if values.is_empty() => f64::NAN,
            RangeFn::Avg => values.iter().sum::<f64>() / values.len() as f64,
            RangeFn::Min => values.iter().copied().reduce(f64::min).unwrap_or(0.0),
            RangeFn::Max => values.iter().copied().reduce(f64::max).unwrap_or(0.0),
            RangeFn::Count => values.len() as f64,
        }
    }
}

/// Regex that matches built-in range calls like `SUM(A1:B5)`.
///
/// Captures:
/// - group 1: function name (e.g. `SUM`)
/// - group 2: start cell ref (e.g. `A1`)
/// - group 3: end cell ref (e.g. `B5`)
pub fn range_fn_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let names = RangeFn::ALL
            .iter()
            .map(|f| f.sheet_name())
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(
            r"\b({})\(\s*([A-Za-z]+[0-9]+)\s*:\s*([A-Za-z]+[0-9]+)\s*\)",
            names
        ))
        .expect("built-in range regex must compile")
    })
}

/// State shared by every registered closure.
#[derive(Clone)]
struct CellEnv {
    grid: Grid,
    value_cache: ValueCache,
    reads: ReadTracker,
    bounds: Arc<GridBounds>,
    depth: Arc<AtomicUsize>,
}

/// Decrements the evaluation depth when a nested evaluation finishes.
struct DepthGuard(Arc<AtomicUsize>);

impl Drop for DepthGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn invalid_arg(message: &str) -> Box<EvalAltResult> {
    EvalAltResult::ErrorRuntime(message.into(), Position::NONE).into()
}

fn to_usize(value: i64, label: &str) -> Result<usize, Box<EvalAltResult>> {
    usize::try_from(value).map_err(|_| invalid_arg(&format!("{} must be >= 0", label)))
}

fn to_cell_ref(row: i64, col: i64) -> Result<CellRef, Box<EvalAltResult>> {
    Ok(CellRef::new(to_usize(row, "row")?, to_usize(col, "col")?))
}

fn as_number(value: &Dynamic) -> Option<f64> {
    if let Ok(n) = value.as_float() {
        return Some(n);
    }
    if let Ok(n) = value.as_int() {
        return Some(n as f64);
    }
    None
}

impl CellEnv {
    fn contents(&self, cell_ref: &CellRef) -> CellType {
        self.grid
            .get(cell_ref)
            .map(|cell| cell.contents.clone())
            .unwrap_or(CellType::Empty)
    }

    /// Evaluate a referenced formula cell, consulting the value cache first.
    fn formula_value(
        &self,
        ctx: &NativeCallContext,
        cell_ref: CellRef,
        formula: &str,
    ) -> Result<Dynamic, Box<EvalAltResult>> {
        if let Some(cached) = self.value_cache.get(&cell_ref) {
            return Ok(cached.clone());
        }

        let depth = self.depth.fetch_add(1, Ordering::SeqCst);
        let _guard = DepthGuard(self.depth.clone());
        if depth >= MAX_EVAL_DEPTH {
            return Err(invalid_arg(&format!(
                "reference chain deeper than {} at {}",
                MAX_EVAL_DEPTH, cell_ref
            )));
        }

        let _scope = self.reads.enter(cell_ref);
        let value = ctx.engine().eval::<Dynamic>(&preprocess_formula(formula))?;
        self.value_cache.insert(cell_ref, value.clone());
        Ok(value)
    }

    /// Numeric view of a cell: text is NaN, empty is zero.
    fn number(&self, ctx: &NativeCallContext, cell_ref: CellRef) -> Result<f64, Box<EvalAltResult>> {
        self.reads.record(cell_ref);
        Ok(match self.contents(&cell_ref) {
            CellType::Empty => 0.0,
            CellType::Number(n) => n,
            CellType::Text(_) => f64::NAN,
            CellType::Formula(f) => as_number(&self.formula_value(ctx, cell_ref, &f)?).unwrap_or(f64::NAN),
        })
    }

    /// Typed view of a cell.
    fn value(&self, ctx: &NativeCallContext, cell_ref: CellRef) -> Result<Dynamic, Box<EvalAltResult>> {
        self.reads.record(cell_ref);
        Ok(match self.contents(&cell_ref) {
            CellType::Empty => Dynamic::UNIT,
            CellType::Number(n) => Dynamic::from(n),
            CellType::Text(s) => Dynamic::from(s),
            CellType::Formula(f) => self.formula_value(ctx, cell_ref, &f)?,
        })
    }

    /// Numeric values in a rectangle, skipping empty and text cells.
    fn range_numbers(
        &self,
        ctx: &NativeCallContext,
        corners: [i64; 4],
    ) -> Result<Vec<f64>, Box<EvalAltResult>> {
        let mut values = Vec::new();
        for cell_ref in cells_in(corners, self.bounds.get())? {
            self.reads.record(cell_ref);
            match self.contents(&cell_ref) {
                CellType::Number(n) => values.push(n),
                CellType::Formula(f) => {
                    if let Some(n) = as_number(&self.formula_value(ctx, cell_ref, &f)?) {
                        values.push(n);
                    }
                }
                CellType::Empty | CellType::Text(_) => {}
            }
        }
        Ok(values)
    }

    fn range_count(&self, corners: [i64; 4]) -> Result<i64, Box<EvalAltResult>> {
        let count = cells_in(corners, self.bounds.get())?
            .inspect(|cell_ref| self.reads.record(*cell_ref))
            .filter(|cell_ref| !matches!(self.contents(cell_ref), CellType::Empty))
            .count();
        Ok(count as i64)
    }
}

/// Cells of the rectangle spanned by `[r1, c1, r2, c2]`, row-major, cut off
/// at the grid's `(rows, cols)`. Cells past the grid are empty, and native
/// loops do not count against the operation budget.
fn cells_in(
    corners: [i64; 4],
    (rows, cols): (usize, usize),
) -> Result<impl Iterator<Item = CellRef>, Box<EvalAltResult>> {
    let [r1, c1, r2, c2] = corners;
    let (r1, c1) = (to_usize(r1, "row")?, to_usize(c1, "col")?);
    let (r2, c2) = (to_usize(r2, "row")?, to_usize(c2, "col")?);
    let row_end = r1.max(r2).saturating_add(1).min(rows);
    let col_end = c1.max(c2).saturating_add(1).min(cols);
    let col_span = c1.min(c2)..col_end;
    Ok((r1.min(r2)..row_end)
        .flat_map(move |row| col_span.clone().map(move |col| CellRef::new(row, col))))
}

/// Register all built-in functions into the Rhai engine.
pub fn register_builtins(engine: &mut Engine, state: EngineState) {
    let env = CellEnv {
        grid: state.grid,
        value_cache: state.value_cache,
        reads: state.reads,
        bounds: state.bounds,
        depth: Arc::new(AtomicUsize::new(0)),
    };

    // CELL(row, col): numeric value at cell (text -> NaN, empty -> 0)
    let e = env.clone();
    engine.register_fn(
        "CELL",
        move |ctx: NativeCallContext, row: i64, col: i64| -> Result<f64, Box<EvalAltResult>> {
            e.number(&ctx, to_cell_ref(row, col)?)
        },
    );

    // VALUE(row, col): typed value (text stays text, formulas yield their result)
    let e = env.clone();
    engine.register_fn(
        "VALUE",
        move |ctx: NativeCallContext, row: i64, col: i64| -> Result<Dynamic, Box<EvalAltResult>> {
            e.value(&ctx, to_cell_ref(row, col)?)
        },
    );

    let e = env.clone();
    engine.register_fn(
        RangeFn::Count.rhai_name(),
        move |r1: i64, c1: i64, r2: i64, c2: i64| -> Result<i64, Box<EvalAltResult>> {
            e.range_count([r1, c1, r2, c2])
        },
    );

    for f in [RangeFn::Sum, RangeFn::Avg, RangeFn::Min, RangeFn::Max] {
        let e = env.clone();
        engine.register_fn(
            f.rhai_name(),
            move |ctx: NativeCallContext, r1: i64, c1: i64, r2: i64, c2: i64| -> Result<f64, Box<EvalAltResult>> {
                Ok(f.fold(&e.range_numbers(&ctx, [r1, c1, r2, c2])?))
            },
        );
    }
}
