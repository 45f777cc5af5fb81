//! Field-expression Abstract Syntax Tree definitions
//!
//! This crate defines the AST for the restricted expression language used by
//! form fields for hide/readonly/calculate logic. The language is small by
//! design: literals, field-id references, unary and binary operators, and a
//! fixed table of built-in function calls.

mod expression;
mod literal;
mod operator;

pub use expression::*;
pub use literal::*;
pub use operator::*;

/// Type alias for boxed expressions
pub type BoxExpr = Box<Expression>;

/// An identifier: either a field id or a built-in function name
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Identifier {
    /// The identifier text
    pub name: String,
}

impl Identifier {
    /// Create a new identifier
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The identifier text
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Self { name }
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
