//! Literal AST nodes for field expressions

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A literal value in a field expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// Null literal (`null` or `undefined`)
    Null,
    /// Boolean literal (true/false)
    Boolean(bool),
    /// Numeric literal (arbitrary precision)
    Number(Decimal),
    /// String literal (single-quoted)
    Text(String),
}

impl Literal {
    /// Whether this literal is empty for the purposes of `isEmpty`
    pub fn is_empty(&self) -> bool {
        match self {
            Literal::Null => true,
            Literal::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Boolean(b) => write!(f, "{b}"),
            Literal::Number(n) => write!(f, "{n}"),
            Literal::Text(s) => write!(f, "'{s}'"),
        }
    }
}
