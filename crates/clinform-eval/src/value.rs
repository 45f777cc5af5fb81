//! Typed evaluation results
//!
//! Expressions produce one of a closed set of value shapes. Coercions are
//! deliberately narrow: loose equality bridges text with numbers, booleans
//! and dates; everything else compares false rather than erroring.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;

/// The result of evaluating a field expression
#[derive(Debug, Clone, PartialEq)]
pub enum EvalValue {
    /// No value (unresolved/empty determinant)
    Null,
    /// Boolean result
    Bool(bool),
    /// Numeric result
    Number(Decimal),
    /// Textual result (also carries coded uuids and toggle sentinels)
    Text(String),
    /// Date result
    Date(NaiveDate),
    /// List result (multi-select determinants)
    List(Vec<EvalValue>),
}

impl EvalValue {
    /// Truthiness in boolean contexts
    pub fn is_truthy(&self) -> bool {
        match self {
            EvalValue::Null => false,
            EvalValue::Bool(b) => *b,
            EvalValue::Number(n) => !n.is_zero(),
            EvalValue::Text(s) => !s.is_empty(),
            EvalValue::Date(_) | EvalValue::List(_) => true,
        }
    }

    /// Emptiness for `isEmpty`
    pub fn is_empty(&self) -> bool {
        match self {
            EvalValue::Null => true,
            EvalValue::Text(s) => s.trim().is_empty(),
            EvalValue::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Numeric view, parsing text if needed
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            EvalValue::Number(n) => Some(*n),
            EvalValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Date view, parsing an ISO text prefix if needed
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            EvalValue::Date(d) => Some(*d),
            EvalValue::Text(s) => {
                let prefix = s.get(..10)?;
                NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
            }
            _ => None,
        }
    }

    /// Strict equality: same shape, same value
    pub fn strict_eq(&self, other: &EvalValue) -> bool {
        self == other
    }

    /// Loose equality: coerces text against number, boolean and date
    pub fn loose_eq(&self, other: &EvalValue) -> bool {
        use EvalValue as V;
        match (self, other) {
            (V::Null, V::Null) => true,
            (V::Text(s), V::Bool(b)) | (V::Bool(b), V::Text(s)) => {
                (*b && s == "true") || (!*b && s == "false")
            }
            (a @ V::Text(_), b @ V::Number(_)) | (a @ V::Number(_), b @ V::Text(_)) => {
                match (a.as_number(), b.as_number()) {
                    (Some(x), Some(y)) => x == y,
                    _ => false,
                }
            }
            (a @ V::Text(_), b @ V::Date(_)) | (a @ V::Date(_), b @ V::Text(_)) => {
                match (a.as_date(), b.as_date()) {
                    (Some(x), Some(y)) => x == y,
                    _ => false,
                }
            }
            _ => self == other,
        }
    }

    /// Relational ordering where the shapes allow one
    pub fn partial_compare(&self, other: &EvalValue) -> Option<Ordering> {
        use EvalValue as V;
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return a.partial_cmp(&b);
        }
        if let (Some(a), Some(b)) = (self.as_date(), other.as_date()) {
            return a.partial_cmp(&b);
        }
        match (self, other) {
            (V::Text(a), V::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Whether this value contains `needle` (list membership, or equality
    /// for scalars)
    pub fn contains(&self, needle: &EvalValue) -> bool {
        match self {
            EvalValue::List(items) => items.iter().any(|item| item.loose_eq(needle)),
            other => other.loose_eq(needle),
        }
    }
}

impl fmt::Display for EvalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalValue::Null => write!(f, "null"),
            EvalValue::Bool(b) => write!(f, "{b}"),
            EvalValue::Number(n) => write!(f, "{n}"),
            EvalValue::Text(s) => write!(f, "{s}"),
            EvalValue::Date(d) => write!(f, "{d}"),
            EvalValue::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(EvalValue::Null, false)]
    #[case(EvalValue::Text(String::new()), false)]
    #[case(EvalValue::Text("false".into()), true)]
    #[case(EvalValue::Number(Decimal::ZERO), false)]
    #[case(EvalValue::Bool(true), true)]
    fn truthiness(#[case] value: EvalValue, #[case] expected: bool) {
        assert_eq!(value.is_truthy(), expected);
    }

    #[test]
    fn loose_equality_bridges_text_and_number() {
        assert!(EvalValue::Text("5".into()).loose_eq(&EvalValue::Number(Decimal::from(5))));
        assert!(!EvalValue::Text("5".into()).strict_eq(&EvalValue::Number(Decimal::from(5))));
    }

    #[test]
    fn dates_compare_through_text() {
        let date = EvalValue::Date(NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
        let text = EvalValue::Text("2026-03-14T00:00:00".into());
        assert!(date.loose_eq(&text));
        assert_eq!(date.partial_compare(&text), Some(Ordering::Equal));
    }

    #[test]
    fn list_containment_is_loose() {
        let list = EvalValue::List(vec![EvalValue::Text("a".into()), EvalValue::Text("b".into())]);
        assert!(list.contains(&EvalValue::Text("b".into())));
        assert!(!list.contains(&EvalValue::Text("c".into())));
    }
}
