//! Rhai engine creation and evaluation result types.

use rhai::{Engine, EvalAltResult};
use thiserror::Error;

use super::Dynamic;
use super::shared::EngineState;

/// Default operation budget for a single formula evaluation.
pub const DEFAULT_MAX_OPERATIONS: u64 = 100_000;

/// Create a Rhai engine with built-ins registered against shared workbook state.
///
/// `max_operations` bounds a single evaluation; exceeding it yields
/// [`EvalResult::Paused`] rather than a failure.
pub fn create_engine(state: EngineState, max_operations: u64) -> Engine {
    let mut engine = Engine::new();
    engine.set_max_operations(max_operations);
    crate::builtins::register_builtins(&mut engine, state);
    engine
}

/// Why a formula produced no value.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FailureReason {
    /// Text handed to formula evaluation does not start with `=`.
    #[error("#NOTFORMULA!")]
    NotFormulaString,

    #[error("#PARSE!")]
    IllFormedFormula(String),

    /// Unknown function or identifier.
    #[error("#NAME?")]
    NotImplemented(String),

    #[error("#CYCLE!")]
    Cycle,

    #[error("#ERR!")]
    Runtime(String),
}

/// A successfully evaluated value.
#[derive(Clone, Debug)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
    /// Arrays, maps and other values that need [`serialise_value`](super::serialise_value).
    Other(Dynamic),
}

impl Value {
    pub fn from_dynamic(value: Dynamic) -> Value {
        if value.is_unit() {
            Value::Text(String::new())
        } else if let Ok(n) = value.as_float() {
            Value::Number(n)
        } else if let Ok(n) = value.as_int() {
            Value::Number(n as f64)
        } else if let Ok(b) = value.as_bool() {
            Value::Bool(b)
        } else if value.is_string() || value.is_char() {
            Value::Text(value.to_string())
        } else {
            Value::Other(value)
        }
    }
}

/// Outcome of evaluating a cell or formula text.
#[derive(Clone, Debug)]
pub enum EvalResult {
    Success(Value),
    Failure(FailureReason),
    /// Evaluation ran out of its operation budget before finishing.
    Paused,
}

impl EvalResult {
    pub(crate) fn from_error(err: &EvalAltResult) -> EvalResult {
        match err {
            EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => EvalResult::from_error(inner),
            EvalAltResult::ErrorTooManyOperations(_) | EvalAltResult::ErrorTerminated(..) => {
                EvalResult::Paused
            }
            EvalAltResult::ErrorParsing(..) => {
                EvalResult::Failure(FailureReason::IllFormedFormula(err.to_string()))
            }
            EvalAltResult::ErrorFunctionNotFound(name, _)
            | EvalAltResult::ErrorVariableNotFound(name, _) => {
                EvalResult::Failure(FailureReason::NotImplemented(name.clone()))
            }
            _ => EvalResult::Failure(FailureReason::Runtime(err.to_string())),
        }
    }
}
