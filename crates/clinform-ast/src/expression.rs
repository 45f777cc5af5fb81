//! Expression AST nodes for field expressions

use crate::{BinaryOp, BoxExpr, Identifier, Literal, UnaryOp};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// All expression node types in the field-expression language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Literal value (null, boolean, number, string)
    Literal(Literal),
    /// Field-id reference; resolution against the live snapshot is what
    /// drives dependency discovery
    Identifier(Identifier),
    /// Binary operation
    Binary(BinaryExpr),
    /// Unary operation
    Unary(UnaryExpr),
    /// Built-in function call
    Call(CallExpr),
}

/// Binary operation expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpr {
    /// Left operand
    pub left: BoxExpr,
    /// Operator
    pub op: BinaryOp,
    /// Right operand
    pub right: BoxExpr,
}

/// Unary operation expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryExpr {
    /// Operator
    pub op: UnaryOp,
    /// Operand
    pub operand: BoxExpr,
}

/// Built-in function call expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpr {
    /// Function name; must resolve in the built-in table at evaluation time
    pub name: Identifier,
    /// Call arguments; boxed so the expression enum has a finite layout
    pub args: SmallVec<[BoxExpr; 2]>,
}

// Helper constructors
impl Expression {
    /// Create a null literal
    pub fn null() -> Self {
        Self::Literal(Literal::Null)
    }

    /// Create a boolean literal
    pub fn boolean(value: bool) -> Self {
        Self::Literal(Literal::Boolean(value))
    }

    /// Create a numeric literal
    pub fn number(value: impl Into<rust_decimal::Decimal>) -> Self {
        Self::Literal(Literal::Number(value.into()))
    }

    /// Create a string literal
    pub fn text(value: impl Into<String>) -> Self {
        Self::Literal(Literal::Text(value.into()))
    }

    /// Create an identifier reference
    pub fn identifier(name: impl Into<Identifier>) -> Self {
        Self::Identifier(name.into())
    }

    /// Create a binary operation
    pub fn binary(left: Expression, op: BinaryOp, right: Expression) -> Self {
        Self::Binary(BinaryExpr {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    /// Create a unary operation
    pub fn unary(op: UnaryOp, operand: Expression) -> Self {
        Self::Unary(UnaryExpr {
            op,
            operand: Box::new(operand),
        })
    }

    /// Create a function call
    pub fn call(name: impl Into<Identifier>, args: impl IntoIterator<Item = Expression>) -> Self {
        Self::Call(CallExpr {
            name: name.into(),
            args: args.into_iter().map(Box::new).collect(),
        })
    }
}
