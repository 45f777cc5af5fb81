//! Expression operators with precedence information

use serde::{Deserialize, Serialize};

/// Binary operators with their precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    // Precedence 1 (lowest)
    /// Logical or (`||`)
    Or,

    // Precedence 2
    /// Logical and (`&&`)
    And,

    // Precedence 3
    /// Strict equality (`===`)
    StrictEqual,
    /// Strict inequality (`!==`)
    StrictNotEqual,
    /// Loose equality (`==`, coercing)
    Equal,
    /// Loose inequality (`!=`, coercing)
    NotEqual,

    // Precedence 4
    /// Less than
    Less,
    /// Less than or equal
    LessOrEqual,
    /// Greater than
    Greater,
    /// Greater than or equal
    GreaterOrEqual,

    // Precedence 5
    /// Addition (numeric) or concatenation (textual)
    Add,
    /// Subtraction
    Subtract,

    // Precedence 6 (highest for binary)
    /// Multiplication
    Multiply,
    /// Division
    Divide,
}

impl BinaryOp {
    /// Precedence level (higher binds tighter)
    pub const fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::StrictEqual
            | BinaryOp::StrictNotEqual
            | BinaryOp::Equal
            | BinaryOp::NotEqual => 3,
            BinaryOp::Less
            | BinaryOp::LessOrEqual
            | BinaryOp::Greater
            | BinaryOp::GreaterOrEqual => 4,
            BinaryOp::Add | BinaryOp::Subtract => 5,
            BinaryOp::Multiply | BinaryOp::Divide => 6,
        }
    }

    /// Whether this operator compares its operands
    pub const fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::StrictEqual
                | BinaryOp::StrictNotEqual
                | BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::Less
                | BinaryOp::LessOrEqual
                | BinaryOp::Greater
                | BinaryOp::GreaterOrEqual
        )
    }

    /// The source token for this operator
    pub const fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::StrictEqual => "===",
            BinaryOp::StrictNotEqual => "!==",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessOrEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterOrEqual => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Logical not (`!`)
    Not,
    /// Numeric negation (`-`)
    Negate,
}

impl UnaryOp {
    /// The source token for this operator
    pub const fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Negate => "-",
        }
    }
}
