//! Workbook: cached formula evaluation over externally stored cell text.
//!
//! The workbook keeps a parsed copy of every cell, a cache of evaluated
//! formula results, and two reverse maps used to invalidate that cache: one
//! from the references written in formulas, one from the cells evaluations
//! actually read. The text itself belongs to whoever implements
//! [`CellStorage`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dashmap::DashMap;
use rhai::Engine;
use tracing::{debug, trace};

use super::eval::{DEFAULT_MAX_OPERATIONS, EvalResult, FailureReason, Value, create_engine};
use super::{
    Cell, CellRef, CellType, Dynamic, EngineState, Grid, GridBounds, ReadTracker, ValueCache,
    detect_cycle, extract_dependencies, preprocess_formula, serialise_value,
};

/// Where cell text lives. The workbook loads through it during bootstrap and
/// stores through it for locally originated edits.
pub trait CellStorage {
    type Error;

    fn load_cell_text(&self, row: usize, col: usize) -> Result<String, Self::Error>;

    fn store_cell_text(&mut self, row: usize, col: usize, text: &str) -> Result<(), Self::Error>;
}

/// Who produced a cell update handed to [`Workbook::set_cell_text`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellOrigin {
    /// Typed by the local user; forwarded to storage.
    Local,
    /// Already present in storage (remote edit, reload); only refreshes caches.
    External,
}

pub struct Workbook {
    engine: Engine,
    grid: Grid,
    value_cache: ValueCache,
    reads: ReadTracker,
    bounds: Arc<GridBounds>,
    /// Reverse dependency map: cell -> cells whose formulas name it.
    dependents: HashMap<CellRef, HashSet<CellRef>>,
    num_rows: usize,
    num_cols: usize,
}

impl Workbook {
    /// Create an empty workbook. Call [`Workbook::init`] to pull the cells in.
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        Self::with_max_operations(num_rows, num_cols, DEFAULT_MAX_OPERATIONS)
    }

    pub fn with_max_operations(num_rows: usize, num_cols: usize, max_operations: u64) -> Self {
        let state = EngineState {
            grid: Arc::new(DashMap::new()),
            value_cache: Arc::new(DashMap::new()),
            reads: ReadTracker::default(),
            bounds: Arc::new(GridBounds::default()),
        };
        state.bounds.set(num_rows, num_cols);
        let engine = create_engine(state.clone(), max_operations);
        Workbook {
            engine,
            grid: state.grid,
            value_cache: state.value_cache,
            reads: state.reads,
            bounds: state.bounds,
            dependents: HashMap::new(),
            num_rows,
            num_cols,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// Load every cell from storage, then write each one back.
    ///
    /// The write-back pass is part of bootstrap: storage that already holds
    /// the same text sees a redundant store for every cell and is expected to
    /// ignore it while it is still initialising.
    pub fn init<S: CellStorage>(&mut self, storage: &mut S) -> Result<(), S::Error> {
        self.grid.clear();
        self.value_cache.clear();
        self.reads.clear();
        self.dependents.clear();

        for row in 0..self.num_rows {
            for col in 0..self.num_cols {
                let text = storage.load_cell_text(row, col)?;
                self.put(CellRef::new(row, col), Cell::from_text(&text));
            }
        }
        self.rebuild_dependents();
        debug!(rows = self.num_rows, cols = self.num_cols, "workbook loaded");

        for row in 0..self.num_rows {
            for col in 0..self.num_cols {
                let text = self.get_cell_text(row, col);
                storage.store_cell_text(row, col, &text)?;
            }
        }
        Ok(())
    }

    /// Change the grid shape. Cells outside the new bounds are dropped and
    /// every cached result is discarded.
    pub fn resize(&mut self, num_rows: usize, num_cols: usize) {
        if num_rows == self.num_rows && num_cols == self.num_cols {
            return;
        }
        self.grid
            .retain(|cell_ref, _| cell_ref.row < num_rows && cell_ref.col < num_cols);
        self.num_rows = num_rows;
        self.num_cols = num_cols;
        self.bounds.set(num_rows, num_cols);
        self.value_cache.clear();
        self.reads.clear();
        self.rebuild_dependents();
        debug!(rows = num_rows, cols = num_cols, "workbook resized");
    }

    /// Text of a cell as the workbook last saw it.
    pub fn get_cell_text(&self, row: usize, col: usize) -> String {
        self.grid
            .get(&CellRef::new(row, col))
            .map(|cell| cell.text.clone())
            .unwrap_or_default()
    }

    /// Replace a cell's text.
    ///
    /// `Local` edits are stored first and only applied to the workbook once
    /// storage accepted them. `External` edits skip storage; an unchanged
    /// text is a no-op so cached results survive a full refresh.
    pub fn set_cell_text<S: CellStorage>(
        &mut self,
        row: usize,
        col: usize,
        text: &str,
        origin: CellOrigin,
        storage: &mut S,
    ) -> Result<(), S::Error> {
        let cell_ref = CellRef::new(row, col);
        match origin {
            CellOrigin::Local => storage.store_cell_text(row, col, text)?,
            CellOrigin::External => {
                if self.get_cell_text(row, col) == text {
                    return Ok(());
                }
            }
        }

        trace!(%cell_ref, ?origin, "cell text updated");
        let cell = Cell::from_text(text);
        let old_deps = self
            .grid
            .get(&cell_ref)
            .map(|old| old.depends_on.clone())
            .unwrap_or_default();
        for dep in &old_deps {
            if let Some(set) = self.dependents.get_mut(dep) {
                set.remove(&cell_ref);
            }
        }
        for dep in &cell.depends_on {
            self.dependents.entry(*dep).or_default().insert(cell_ref);
        }
        self.put(cell_ref, cell);
        self.invalidate(cell_ref);
        Ok(())
    }

    /// Evaluate the cell at `(row, col)`.
    pub fn evaluate_cell(&self, row: usize, col: usize) -> EvalResult {
        let cell_ref = CellRef::new(row, col);
        let contents = self
            .grid
            .get(&cell_ref)
            .map(|cell| cell.contents.clone())
            .unwrap_or(CellType::Empty);

        match contents {
            CellType::Empty => EvalResult::Success(Value::Text(String::new())),
            CellType::Text(s) => EvalResult::Success(Value::Text(s)),
            CellType::Number(n) => EvalResult::Success(Value::Number(n)),
            CellType::Formula(formula) => {
                if let Some(cached) = self.value_cache.get(&cell_ref) {
                    return EvalResult::Success(Value::from_dynamic(cached.clone()));
                }
                if detect_cycle(&cell_ref, &self.grid).is_some() {
                    return EvalResult::Failure(FailureReason::Cycle);
                }
                let _scope = self.reads.enter(cell_ref);
                match self.engine.eval::<Dynamic>(&preprocess_formula(&formula)) {
                    Ok(value) => {
                        self.value_cache.insert(cell_ref, value.clone());
                        EvalResult::Success(Value::from_dynamic(value))
                    }
                    Err(err) => EvalResult::from_error(&err),
                }
            }
        }
    }

    /// Evaluate free-standing formula text (must start with `=`) without
    /// placing it in the grid.
    pub fn evaluate_formula_text(&self, text: &str) -> EvalResult {
        let Some(formula) = text.trim().strip_prefix('=') else {
            return EvalResult::Failure(FailureReason::NotFormulaString);
        };
        let deps = extract_dependencies(formula);
        if deps
            .iter()
            .any(|dep| detect_cycle(dep, &self.grid).is_some())
        {
            return EvalResult::Failure(FailureReason::Cycle);
        }
        match self.engine.eval::<Dynamic>(&preprocess_formula(formula)) {
            Ok(value) => EvalResult::Success(Value::from_dynamic(value)),
            Err(err) => EvalResult::from_error(&err),
        }
    }

    /// Serialise a value that has no primitive representation.
    pub fn serialise_value(&self, value: &Dynamic) -> String {
        serialise_value(value)
    }

    fn put(&self, cell_ref: CellRef, cell: Cell) {
        if matches!(cell.contents, CellType::Empty) && cell.text.is_empty() {
            self.grid.remove(&cell_ref);
        } else {
            self.grid.insert(cell_ref, cell);
        }
    }

    fn rebuild_dependents(&mut self) {
        self.dependents.clear();
        for entry in self.grid.iter() {
            for dep in &entry.value().depends_on {
                self.dependents
                    .entry(*dep)
                    .or_default()
                    .insert(*entry.key());
            }
        }
    }

    /// Drop cached results for a cell and everything that (transitively)
    /// names it in a formula or read it during evaluation.
    fn invalidate(&self, changed: CellRef) {
        let mut to_process = vec![changed];
        let mut visited = HashSet::new();
        while let Some(cell_ref) = to_process.pop() {
            if !visited.insert(cell_ref) {
                continue;
            }
            self.value_cache.remove(&cell_ref);
            if let Some(deps) = self.dependents.get(&cell_ref) {
                to_process.extend(deps.iter().copied());
            }
            to_process.extend(self.reads.readers_of(&cell_ref));
        }
    }
}
