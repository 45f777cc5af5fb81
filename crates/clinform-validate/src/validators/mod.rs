//! Built-in validator implementations

mod conditional_answered;
mod date;
mod default_value;
mod numeric_range;
mod required;
mod text_length;

pub use conditional_answered::ConditionalAnsweredValidator;
pub use date::DateValidator;
pub use default_value::DefaultValueValidator;
pub use numeric_range::NumericRangeValidator;
pub use required::RequiredValidator;
pub use text_length::TextLengthValidator;

use clinform_model::ValidatorConfig;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Read a numeric parameter that may be encoded as a string or a number
pub(crate) fn decimal_param(config: &ValidatorConfig, name: &str) -> Option<Decimal> {
    match config.params.get(name)? {
        serde_json::Value::String(s) => Decimal::from_str(s).ok(),
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

/// Read a length parameter that may be encoded as a string or a number
pub(crate) fn usize_param(config: &ValidatorConfig, name: &str) -> Option<usize> {
    match config.params.get(name)? {
        serde_json::Value::String(s) => s.parse().ok(),
        serde_json::Value::Number(n) => n.as_u64().map(|v| v as usize),
        _ => None,
    }
}
