//! tabledoc_engine - formula evaluation over a grid of cell text.
//!
//! The workbook never owns the authoritative cell text. It loads and stores
//! through a [`CellStorage`](engine::CellStorage) supplied by the caller and
//! keeps only a parsed copy plus cached results.

pub(crate) mod builtins;
pub mod engine;

pub use engine::{
    CellOrigin, CellRef, CellStorage, EvalResult, FailureReason, Value, Workbook,
};
