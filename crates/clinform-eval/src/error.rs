//! Evaluation errors
//!
//! These never escape a cascade pass: the public `evaluate_bool` /
//! `evaluate_calculate` wrappers absorb them into safe defaults. The typed
//! variants exist so tests can assert causes.

use thiserror::Error;

/// Result type for expression evaluation
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors that can occur while evaluating a field expression
#[derive(Debug, Error, Clone)]
pub enum EvalError {
    /// Expression text failed to parse
    #[error("Parse error: {message}")]
    Parse {
        /// What went wrong
        message: String,
    },

    /// An identifier matched no field id
    #[error("Unknown identifier: {name}")]
    UnknownIdentifier {
        /// The unresolved identifier
        name: String,
    },

    /// A call named no built-in function
    #[error("Unknown function: {name}")]
    UnknownFunction {
        /// The unresolved function name
        name: String,
    },

    /// A built-in was called with the wrong number of arguments
    #[error("{function} expects {expected} argument(s), got {found}")]
    Arity {
        /// Function name
        function: &'static str,
        /// Expected argument count
        expected: usize,
        /// Actual argument count
        found: usize,
    },

    /// Operands do not fit the operation
    #[error("Type mismatch in {operation}: {message}")]
    TypeMismatch {
        /// The operation that failed
        operation: String,
        /// What went wrong
        message: String,
    },

    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,
}

impl EvalError {
    /// Create a type-mismatch error
    pub fn type_mismatch(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            operation: operation.into(),
            message: message.into(),
        }
    }
}
