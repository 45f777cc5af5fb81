//! Field-expression parser using Winnow
//!
//! This crate parses the restricted expression language used by form fields
//! (hide/readonly/calculate logic) into a typed AST. The grammar is a small
//! JS-flavored subset: literals, field-id references, `! -` unary operators,
//! `|| && === !== == != < > <= >= + - * /` binary operators, and calls to a
//! fixed set of built-in functions. Parsing uses recursive descent with
//! precedence climbing.

mod combinators;
mod expression;

use clinform_ast::Expression;
use clinform_diagnostics::{FormError, Result};

/// Parse an expression string into an AST.
///
/// The whole input must be consumed; trailing garbage is a parse error.
pub fn parse_expression(text: &str) -> Result<Expression> {
    let mut input = text;
    let expr = expression::expression(&mut input)
        .map_err(|e| FormError::parse(text, e.to_string()))?;
    combinators::ws(&mut input).map_err(|e| FormError::parse(text, e.to_string()))?;
    if !input.is_empty() {
        return Err(FormError::parse(
            text,
            format!("unexpected trailing input: `{input}`"),
        ));
    }
    Ok(expr)
}
