//! Top-level form engine error type

use thiserror::Error;

/// Errors surfaced by the form engine to its callers.
///
/// Expression-evaluation failures never reach this type during a cascade
/// pass: they are absorbed and logged at the evaluation boundary. This enum
/// covers the operations a caller invokes directly.
#[derive(Debug, Error, Clone)]
pub enum FormError {
    /// Expression text could not be parsed
    #[error("Parse error in expression `{expression}`: {message}")]
    Parse {
        /// The offending expression text
        expression: String,
        /// What went wrong
        message: String,
    },

    /// A field id was not present in the materialized field list
    #[error("Unknown field: {id}")]
    UnknownField {
        /// Field id that failed to resolve
        id: String,
    },

    /// A repeat operation referenced a field that is not a repeat template
    #[error("Field {id} is not a repeating field")]
    NotRepeating {
        /// Field id that was expected to repeat
        id: String,
    },

    /// No value adapter is registered for a field type
    #[error("No value adapter registered for field type `{field_type}`")]
    UnknownAdapter {
        /// Field type string with no adapter
        field_type: String,
    },

    /// Adapter failed to transform a value
    #[error("Adapter error on field {id}: {message}")]
    Adapter {
        /// Field the adapter was operating on
        id: String,
        /// What went wrong
        message: String,
    },

    /// Multiple errors occurred
    #[error("Multiple errors ({} total)", .0.len())]
    Multiple(Vec<FormError>),
}

impl FormError {
    /// Create a parse error
    pub fn parse(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            expression: expression.into(),
            message: message.into(),
        }
    }

    /// Create an unknown-field error
    pub fn unknown_field(id: impl Into<String>) -> Self {
        Self::UnknownField { id: id.into() }
    }

    /// Create an adapter error
    pub fn adapter(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Adapter {
            id: id.into(),
            message: message.into(),
        }
    }
}
