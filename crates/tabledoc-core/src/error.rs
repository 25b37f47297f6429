//! Error types for tabledoc core.

use thiserror::Error;

use crate::sequence::SequenceError;

/// Errors that can occur while working with a grid document
#[derive(Error, Debug)]
pub enum TableError {
    #[error("cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    OutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("position {position} is outside a grid of {length} cells")]
    PositionOutOfRange { position: usize, length: usize },

    #[error("no range named {0:?}")]
    RangeNotFound(String),

    /// The sequence no longer holds whole rows. Derived state must not be
    /// trusted until the sequence is resynchronised.
    #[error("sequence length {length} is not a multiple of {cols} columns")]
    StructuralViolation { length: usize, cols: usize },

    #[error("sequence already holds {length} markers")]
    AlreadyPopulated { length: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sequence error: {0}")]
    Sequence(#[from] SequenceError),
}

pub type Result<T> = std::result::Result<T, TableError>;
