//! Field value model - runtime representation of a field's current value
//!
//! The value shape is a closed tagged variant: a field's value is never an
//! untyped slot, and each adapter pattern-matches on the variants it owns.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    /// Free text
    Text(String),
    /// Numeric value (arbitrary precision)
    Number(Decimal),
    /// Calendar date
    Date(NaiveDate),
    /// Boolean (toggle renderings)
    Bool(bool),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Text(s) => write!(f, "{s}"),
            ScalarValue::Number(n) => write!(f, "{n}"),
            ScalarValue::Date(d) => write!(f, "{d}"),
            ScalarValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// The current value of a field.
///
/// Coded variants carry concept-answer uuids; the display label is resolved
/// through the field's concept binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum FieldValue {
    /// No value entered
    #[default]
    Empty,
    /// Scalar value (text/number/date/bool renderings)
    Scalar(ScalarValue),
    /// Single coded answer (select/radio renderings)
    CodedSingle(String),
    /// Multiple coded answers (checkbox renderings)
    CodedMulti(Vec<String>),
    /// Group container; values live on the child fields
    Group,
    /// Repeat container; values live on the cloned instances
    Repeated,
}

impl FieldValue {
    /// Construct a text value
    pub fn text(value: impl Into<String>) -> Self {
        Self::Scalar(ScalarValue::Text(value.into()))
    }

    /// Construct a numeric value
    pub fn number(value: impl Into<Decimal>) -> Self {
        Self::Scalar(ScalarValue::Number(value.into()))
    }

    /// Construct a date value
    pub fn date(value: NaiveDate) -> Self {
        Self::Scalar(ScalarValue::Date(value))
    }

    /// Construct a boolean value
    pub fn bool(value: bool) -> Self {
        Self::Scalar(ScalarValue::Bool(value))
    }

    /// Whether this value counts as empty.
    ///
    /// Whitespace-only text and an empty coded-multi selection are empty;
    /// group/repeat containers are not (their children carry the values).
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Scalar(ScalarValue::Text(s)) => s.trim().is_empty(),
            FieldValue::CodedMulti(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Try to get the value as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(ScalarValue::Text(s)) => Some(s),
            FieldValue::CodedSingle(uuid) => Some(uuid),
            _ => None,
        }
    }

    /// Try to get the value as a number
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            FieldValue::Scalar(ScalarValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// Try to get the value as a date
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Scalar(ScalarValue::Date(d)) => Some(*d),
            _ => None,
        }
    }

    /// Try to get the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Scalar(ScalarValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// The selected coded uuids, if any
    pub fn coded_uuids(&self) -> &[String] {
        match self {
            FieldValue::CodedMulti(items) => items,
            FieldValue::CodedSingle(uuid) => std::slice::from_ref(uuid),
            _ => &[],
        }
    }
}
