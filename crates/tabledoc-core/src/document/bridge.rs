//! Adapter between the formula engine and the cell store.

use std::fmt;

use tabledoc_engine::engine::format_number;
use tabledoc_engine::{CellStorage, EvalResult, Value, Workbook};
use tracing::{debug, trace};

use super::{Document, Mode};
use crate::error::{Result, TableError};
use crate::grid::CellStore;
use crate::sequence::{ActorId, Sequence};

/// Text the formula engine reports for an evaluation that ran out of budget.
const PAUSED: &str = "#PAUSED!";

/// [`CellStorage`] over the sequence, gated by the document [`Mode`].
///
/// Loads always read the sequence. Stores reach it only in [`Mode::Live`];
/// earlier stores are the engine echoing what it just loaded.
pub struct EvalBridge<'a, Q: ?Sized> {
    store: CellStore<'a, Q>,
    mode: Mode,
}

impl<'a, Q: Sequence + ?Sized> EvalBridge<'a, Q> {
    pub fn new(sequence: &'a mut Q, actor: ActorId, mode: Mode) -> Self {
        EvalBridge {
            store: CellStore::new(sequence, actor),
            mode,
        }
    }
}

impl<Q: Sequence + ?Sized> CellStorage for EvalBridge<'_, Q> {
    type Error = TableError;

    fn load_cell_text(&self, row: usize, col: usize) -> Result<String> {
        self.store.get_cell_text(row, col)
    }

    fn store_cell_text(&mut self, row: usize, col: usize, text: &str) -> Result<()> {
        if self.mode != Mode::Live {
            trace!(row, col, mode = ?self.mode, "store suppressed");
            return Ok(());
        }
        self.store.set_cell_text(row, col, text)
    }
}

/// Result of evaluating a cell or formula, ready for display.
///
/// Formula errors are values, not errors: they come back as
/// [`CellValue::Failure`] carrying the reason text.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Bool(bool),
    Failure(String),
}

impl CellValue {
    pub fn is_failure(&self) -> bool {
        matches!(self, CellValue::Failure(_))
    }

    fn from_result(result: EvalResult, workbook: &Workbook) -> CellValue {
        match result {
            EvalResult::Success(Value::Number(n)) => CellValue::Number(n),
            EvalResult::Success(Value::Text(s)) => CellValue::Text(s),
            EvalResult::Success(Value::Bool(b)) => CellValue::Bool(b),
            EvalResult::Success(Value::Other(v)) => CellValue::Text(workbook.serialise_value(&v)),
            EvalResult::Failure(reason) => {
                debug!(?reason, "evaluation failed");
                CellValue::Failure(reason.to_string())
            }
            EvalResult::Paused => CellValue::Failure(PAUSED.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => f.write_str(&format_number(*n)),
            CellValue::Text(s) | CellValue::Failure(s) => f.write_str(s),
            CellValue::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

impl<Q: Sequence> Document<Q> {
    /// Evaluate the cell at `(row, col)`.
    pub fn evaluate_cell(&self, row: usize, col: usize) -> Result<CellValue> {
        self.shape()?.check(row, col)?;
        let result = self.workbook.evaluate_cell(row, col);
        Ok(CellValue::from_result(result, &self.workbook))
    }

    /// Evaluate formula text (starting with `=`) against the current grid.
    pub fn evaluate_formula(&self, formula: &str) -> CellValue {
        let result = self.workbook.evaluate_formula_text(formula);
        CellValue::from_result(result, &self.workbook)
    }
}
