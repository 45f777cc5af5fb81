//! Per-field diagnostics produced by the validator chain

use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Error - blocks form submission
    Error,
    /// Warning - surfaced to the user but does not block
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Stable issue codes used across validators and the submission summary.
///
/// The dotted string form is the wire contract consumed by rendering layers;
/// `as_str` is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueCode {
    /// Required field left empty
    FieldRequired,
    /// Numeric value outside the declared min/max bounds
    NumericOutOfBounds,
    /// Numeric value has decimals where only integers are allowed
    DecimalsNotAllowed,
    /// Text length outside the declared minLength/maxLength bounds
    TextOutOfBounds,
    /// Date lies in the future and future dates are not allowed
    DateInFuture,
    /// Date could not be parsed
    DateInvalid,
    /// Default/calculated value rejected before being applied
    DefaultValueInvalid,
    /// Value present while the governing reference answer does not allow it
    ConditionalAnswerMismatch,
    /// Validator implementation failed internally (fail-closed)
    InternalError,
}

impl IssueCode {
    /// The dotted wire representation of this code
    pub const fn as_str(&self) -> &'static str {
        match self {
            IssueCode::FieldRequired => "field.required",
            IssueCode::NumericOutOfBounds => "value.outOfBounds",
            IssueCode::DecimalsNotAllowed => "value.decimalsNotAllowed",
            IssueCode::TextOutOfBounds => "text.outOfBounds",
            IssueCode::DateInFuture => "date.inFuture",
            IssueCode::DateInvalid => "date.invalid",
            IssueCode::DefaultValueInvalid => "default.invalid",
            IssueCode::ConditionalAnswerMismatch => "conditional.answerMismatch",
            IssueCode::InternalError => "internal.error",
        }
    }

    /// Human category used by the form-level submission summary
    pub const fn category(&self) -> &'static str {
        match self {
            IssueCode::FieldRequired => "required fields missing",
            IssueCode::NumericOutOfBounds
            | IssueCode::DecimalsNotAllowed
            | IssueCode::TextOutOfBounds => "values out of bounds",
            IssueCode::DateInFuture | IssueCode::DateInvalid => "invalid dates",
            IssueCode::DefaultValueInvalid => "invalid default values",
            IssueCode::ConditionalAnswerMismatch => "conflicting answers",
            IssueCode::InternalError => "internal validation failures",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single validation result attached to a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Stable issue code
    pub code: IssueCode,
    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    /// Create a new warning diagnostic
    pub fn warning(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    /// Whether this diagnostic blocks submission
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.severity, self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_codes_render_dotted_form() {
        assert_eq!(IssueCode::FieldRequired.to_string(), "field.required");
        assert_eq!(IssueCode::NumericOutOfBounds.to_string(), "value.outOfBounds");
    }

    #[test]
    fn diagnostic_display_includes_severity_and_code() {
        let d = Diagnostic::error(IssueCode::FieldRequired, "Field is required");
        assert_eq!(d.to_string(), "error: field.required - Field is required");
        assert!(d.is_error());
    }
}
