//! Expression parser using recursive descent with precedence climbing
//!
//! One function per precedence level, each looping on its operator set. The
//! multi-character operators are tried longest-first so `===` is never split
//! into `==` + `=`.

use crate::combinators::{identifier, keyword, lit, number, string_literal, ws, Input, PResult};
use clinform_ast::{BinaryOp, CallExpr, Expression, Literal, UnaryOp};
use winnow::combinator::{opt, separated};
use winnow::prelude::*;

/// Parse a full expression (entry point, lowest precedence)
pub(crate) fn expression(input: &mut Input<'_>) -> PResult<Expression> {
    ws(input)?;
    or_expression(input)
}

/// Parse `||` (lowest precedence)
fn or_expression(input: &mut Input<'_>) -> PResult<Expression> {
    let mut left = and_expression(input)?;

    loop {
        ws(input)?;
        if lit("||")(input).is_ok() {
            let right = and_expression(input)?;
            left = Expression::binary(left, BinaryOp::Or, right);
        } else {
            break;
        }
    }

    Ok(left)
}

/// Parse `&&`
fn and_expression(input: &mut Input<'_>) -> PResult<Expression> {
    let mut left = equality_expression(input)?;

    loop {
        ws(input)?;
        if lit("&&")(input).is_ok() {
            let right = equality_expression(input)?;
            left = Expression::binary(left, BinaryOp::And, right);
        } else {
            break;
        }
    }

    Ok(left)
}

/// Parse `===`, `!==`, `==`, `!=` (longest operator first)
fn equality_expression(input: &mut Input<'_>) -> PResult<Expression> {
    let mut left = relational_expression(input)?;

    loop {
        ws(input)?;
        let op = if lit("===")(input).is_ok() {
            Some(BinaryOp::StrictEqual)
        } else if lit("!==")(input).is_ok() {
            Some(BinaryOp::StrictNotEqual)
        } else if lit("==")(input).is_ok() {
            Some(BinaryOp::Equal)
        } else if lit("!=")(input).is_ok() {
            Some(BinaryOp::NotEqual)
        } else {
            None
        };

        if let Some(op) = op {
            ws(input)?;
            let right = relational_expression(input)?;
            left = Expression::binary(left, op, right);
        } else {
            break;
        }
    }

    Ok(left)
}

/// Parse `<=`, `>=`, `<`, `>`
fn relational_expression(input: &mut Input<'_>) -> PResult<Expression> {
    let mut left = additive_expression(input)?;

    loop {
        ws(input)?;
        let op = if lit("<=")(input).is_ok() {
            Some(BinaryOp::LessOrEqual)
        } else if lit(">=")(input).is_ok() {
            Some(BinaryOp::GreaterOrEqual)
        } else if lit("<")(input).is_ok() {
            Some(BinaryOp::Less)
        } else if lit(">")(input).is_ok() {
            Some(BinaryOp::Greater)
        } else {
            None
        };

        if let Some(op) = op {
            ws(input)?;
            let right = additive_expression(input)?;
            left = Expression::binary(left, op, right);
        } else {
            break;
        }
    }

    Ok(left)
}

/// Parse `+`, `-`
fn additive_expression(input: &mut Input<'_>) -> PResult<Expression> {
    let mut left = multiplicative_expression(input)?;

    loop {
        ws(input)?;
        let op = if lit("+")(input).is_ok() {
            Some(BinaryOp::Add)
        } else if lit("-")(input).is_ok() {
            Some(BinaryOp::Subtract)
        } else {
            None
        };

        if let Some(op) = op {
            ws(input)?;
            let right = multiplicative_expression(input)?;
            left = Expression::binary(left, op, right);
        } else {
            break;
        }
    }

    Ok(left)
}

/// Parse `*`, `/`
fn multiplicative_expression(input: &mut Input<'_>) -> PResult<Expression> {
    let mut left = unary_expression(input)?;

    loop {
        ws(input)?;
        let op = if lit("*")(input).is_ok() {
            Some(BinaryOp::Multiply)
        } else if lit("/")(input).is_ok() {
            Some(BinaryOp::Divide)
        } else {
            None
        };

        if let Some(op) = op {
            ws(input)?;
            let right = unary_expression(input)?;
            left = Expression::binary(left, op, right);
        } else {
            break;
        }
    }

    Ok(left)
}

/// Parse `!expr`, `-expr`, or a primary expression
fn unary_expression(input: &mut Input<'_>) -> PResult<Expression> {
    ws(input)?;

    // `!==` must not be consumed as a unary `!`; only a bare `!` negates.
    if input.starts_with('!') && !input.starts_with("!=") {
        lit("!")(input)?;
        let operand = unary_expression(input)?;
        return Ok(Expression::unary(UnaryOp::Not, operand));
    }

    if input.starts_with('-') {
        lit("-")(input)?;
        let operand = unary_expression(input)?;
        return Ok(Expression::unary(UnaryOp::Negate, operand));
    }

    primary_expression(input)
}

/// Parse a primary expression: parens, literal, call, or identifier
fn primary_expression(input: &mut Input<'_>) -> PResult<Expression> {
    ws(input)?;

    if lit("(")(input).is_ok() {
        let inner = expression(input)?;
        ws(input)?;
        lit(")")(input)?;
        return Ok(inner);
    }

    if input.starts_with('\'') {
        return Ok(Expression::Literal(Literal::Text(string_literal(input)?)));
    }

    if input.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return Ok(Expression::Literal(Literal::Number(number(input)?)));
    }

    // Keyword literals before plain identifiers
    if keyword("true")(input).is_ok() {
        return Ok(Expression::boolean(true));
    }
    if keyword("false")(input).is_ok() {
        return Ok(Expression::boolean(false));
    }
    if keyword("null")(input).is_ok() || keyword("undefined")(input).is_ok() {
        return Ok(Expression::null());
    }

    let name = identifier(input)?;
    ws(input)?;

    // Identifier followed by `(` is a built-in call
    if lit("(")(input).is_ok() {
        let args: Vec<Expression> = separated(
            0..,
            |i: &mut Input<'_>| {
                ws(i)?;
                let arg = expression(i)?;
                ws(i)?;
                Ok(arg)
            },
            lit(","),
        )
        .parse_next(input)?;
        let _ = opt(lit(",")).parse_next(input)?;
        ws(input)?;
        lit(")")(input)?;
        return Ok(Expression::Call(CallExpr {
            name,
            args: args.into_iter().map(Box::new).collect(),
        }));
    }

    Ok(Expression::Identifier(name))
}
