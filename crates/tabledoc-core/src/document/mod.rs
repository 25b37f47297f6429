//! Grid document: the façade the view layer talks to.

mod bridge;
mod ops;
mod state;
mod sync;

pub use bridge::{CellValue, EvalBridge};
pub use state::{Document, Mode};
pub use sync::Reconciliation;
