//! tabledoc-core - spreadsheet grid over a collaborative marker sequence.
//!
//! The grid has no storage of its own. Cell `(row, col)` is the marker at
//! position `row * num_cols + col` of a [`Sequence`], the column count is a
//! counter kept by the sequence, and the row count follows from the length.

pub mod config;
pub mod document;
pub mod error;
pub mod grid;
pub mod sequence;

pub use config::TableConfig;
pub use document::{CellValue, Document, EvalBridge, Mode, Reconciliation};
pub use error::{Result, TableError};
pub use grid::{CellRange, CellStore, GridIndex};
pub use sequence::{
    ActorId, ChangeEvent, IntervalHandle, Marker, MemorySequence, Sequence, SequenceError,
    SequenceOp, TaggedOp, Version,
};

pub use tabledoc_engine::CellRef;
