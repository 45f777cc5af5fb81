//! Validator chain and built-in field validators
//!
//! A field carries an ordered list of validator configs; each config's
//! `type` string resolves to a registered validator implementation and the
//! chain concatenates the results. Unknown types are silently skipped. A
//! field whose submission state is flagged `unspecified` short-circuits to
//! no diagnostics.
//!
//! Validator faults fail CLOSED: an internal validator error surfaces as one
//! blocking `internal.error` diagnostic. This is a deliberate deviation from
//! fail-open behavior, chosen for clinical-data correctness.

mod registry;
mod validators;

pub use registry::*;
pub use validators::*;

use chrono::NaiveDate;
use clinform_diagnostics::Diagnostic;
use clinform_model::{Field, FieldId, FieldValue, ValidatorConfig};
use indexmap::IndexMap;
use thiserror::Error;

/// Result type for validator implementations
pub type ValidatorResult<T> = Result<T, ValidatorError>;

/// Internal validator failure
#[derive(Debug, Error, Clone)]
pub enum ValidatorError {
    /// Validator config is malformed
    #[error("invalid validator config: {0}")]
    Config(String),

    /// Validator implementation failed
    #[error("validator failure: {0}")]
    Internal(String),
}

/// Everything a validator may inspect for one field
pub struct ValidationInput<'a> {
    /// The field under validation
    pub field: &'a Field,
    /// The value under validation (may differ from `field.value` when
    /// pre-validating a candidate)
    pub value: &'a FieldValue,
    /// The full materialized field list, for cross-field validators
    pub fields: &'a IndexMap<FieldId, Field>,
    /// Today's date, from the session clock
    pub today: NaiveDate,
}

/// A pluggable per-field validator
pub trait FieldValidator: Send + Sync {
    /// Validate a value against one validator config
    fn validate(
        &self,
        input: &ValidationInput<'_>,
        config: &ValidatorConfig,
    ) -> ValidatorResult<Vec<Diagnostic>>;
}
