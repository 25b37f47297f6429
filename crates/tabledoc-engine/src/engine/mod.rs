//! Formula engine API.
//!
//! - [`Cell`], [`CellType`], [`Grid`] - Data structures for cell storage
//! - [`CellRef`] - Cell reference parsing (A1 notation ↔ row/col indices)
//! - [`detect_cycle`] - Circular dependency detection
//! - [`ReadTracker`] - Cells actually read while formulas evaluate
//! - [`extract_dependencies`] - Parse formula dependencies
//! - [`preprocess_formula`] - Transform formulas for Rhai evaluation
//! - [`Workbook`] - Cached formula evaluation over externally stored cell text
//! - [`serialise_value`] - Format values for display

mod cell;
mod cell_ref;
mod cycle;
mod deps;
mod eval;
mod format;
mod preprocess;
mod shared;
mod workbook;

pub use cell::{Cell, CellType, Grid, ValueCache};
pub use cell_ref::{CellRef, ParseCellRefError};
pub use cycle::detect_cycle;
pub use deps::extract_dependencies;
pub use eval::{DEFAULT_MAX_OPERATIONS, EvalResult, FailureReason, Value, create_engine};
pub use format::{format_number, serialise_value};
pub use preprocess::preprocess_formula;
pub use shared::{EngineState, GridBounds, ReadScope, ReadTracker};
pub use workbook::{CellOrigin, CellStorage, Workbook};

pub use rhai::Dynamic;
