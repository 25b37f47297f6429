//! State a workbook shares with the functions registered in its engine.
//!
//! Static dependency extraction only sees A1 tokens. A formula calling
//! `CELL(r, c)` with computed arguments, or aggregating over a range too
//! large to expand, reads cells no token names. Every read made through the
//! registered functions is therefore recorded against the formula cell being
//! evaluated, and invalidation follows those edges too.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;

use super::{CellRef, Grid, ValueCache};

/// Current grid shape, readable from inside an evaluation.
#[derive(Debug, Default)]
pub struct GridBounds {
    rows: AtomicUsize,
    cols: AtomicUsize,
}

impl GridBounds {
    pub fn set(&self, rows: usize, cols: usize) {
        self.rows.store(rows, Ordering::SeqCst);
        self.cols.store(cols, Ordering::SeqCst);
    }

    /// `(rows, cols)`
    pub fn get(&self) -> (usize, usize) {
        (self.rows.load(Ordering::SeqCst), self.cols.load(Ordering::SeqCst))
    }
}

/// Cells read by formula evaluations, keyed by the cell that was read.
#[derive(Clone, Debug, Default)]
pub struct ReadTracker {
    /// Formula cells being evaluated, innermost last.
    active: Arc<Mutex<Vec<CellRef>>>,
    /// Cell read -> formula cells whose last evaluation read it.
    readers: Arc<DashMap<CellRef, HashSet<CellRef>>>,
}

/// Ends a formula cell's evaluation when dropped.
pub struct ReadScope {
    active: Arc<Mutex<Vec<CellRef>>>,
}

impl Drop for ReadScope {
    fn drop(&mut self) {
        lock(&self.active).pop();
    }
}

fn lock(active: &Mutex<Vec<CellRef>>) -> MutexGuard<'_, Vec<CellRef>> {
    active.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ReadTracker {
    /// Attribute reads to `cell` until the returned scope is dropped.
    pub fn enter(&self, cell: CellRef) -> ReadScope {
        lock(&self.active).push(cell);
        ReadScope {
            active: self.active.clone(),
        }
    }

    /// Note that the innermost formula being evaluated read `cell`. Reads
    /// made by free-standing formula text have no reader and are dropped.
    pub fn record(&self, cell: CellRef) {
        let reader = lock(&self.active).last().copied();
        if let Some(reader) = reader {
            self.readers.entry(cell).or_default().insert(reader);
        }
    }

    pub fn readers_of(&self, cell: &CellRef) -> Vec<CellRef> {
        self.readers
            .get(cell)
            .map(|readers| readers.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        self.readers.clear();
    }
}

/// Everything [`create_engine`](super::create_engine) wires into the
/// registered functions.
#[derive(Clone, Debug, Default)]
pub struct EngineState {
    pub grid: Grid,
    pub value_cache: ValueCache,
    pub reads: ReadTracker,
    pub bounds: Arc<GridBounds>,
}
