//! Error types for the tabledoc command line

use thiserror::Error;

/// Errors in the command line itself, before any document is touched.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0} requires a value")]
    MissingValue(String),

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Unexpected argument: {0}")]
    UnexpectedArgument(String),

    #[error("{flag} expects a number, got '{value}'")]
    BadNumber { flag: String, value: String },

    #[error("'{0}' is not a cell reference")]
    BadCell(String),

    #[error("'{0}' is not a range like A1:B2")]
    BadRange(String),

    #[error("{flag} expects NAME=VALUE, got '{value}'")]
    BadAssignment { flag: String, value: String },
}

pub type Result<T> = std::result::Result<T, CliError>;
