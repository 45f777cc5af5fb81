//! Shared token parsers for the field-expression grammar

use clinform_ast::Identifier;
use rust_decimal::Decimal;
use std::str::FromStr;
use winnow::ascii::digit1;
use winnow::combinator::opt;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{literal, one_of, take_while};

/// Parser input type
pub(crate) type Input<'a> = &'a str;

/// Parser result type
pub(crate) type PResult<T> = winnow::ModalResult<T>;

/// Consume optional whitespace
pub(crate) fn ws(input: &mut Input<'_>) -> PResult<()> {
    take_while(0.., |c: char| c.is_whitespace())
        .void()
        .parse_next(input)
}

/// Match a literal token
pub(crate) fn lit<'a>(token: &'static str) -> impl FnMut(&mut Input<'a>) -> PResult<()> {
    move |input: &mut Input<'a>| literal(token).void().parse_next(input)
}

/// Match a keyword: the literal must not be followed by an identifier char
pub(crate) fn keyword<'a>(kw: &'static str) -> impl FnMut(&mut Input<'a>) -> PResult<()> {
    move |input: &mut Input<'a>| {
        let checkpoint = *input;
        literal(kw).void().parse_next(input)?;
        if input
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            *input = checkpoint;
            return Err(ErrMode::Backtrack(ContextError::new()));
        }
        Ok(())
    }
}

/// Parse an identifier: `[A-Za-z_][A-Za-z0-9_]*`
///
/// Field ids produced by repeat expansion (`weight_1`) fit this shape.
pub(crate) fn identifier(input: &mut Input<'_>) -> PResult<Identifier> {
    let text = (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)?;
    Ok(Identifier::new(text))
}

/// Parse a single-quoted string literal; `''` escapes a quote
pub(crate) fn string_literal(input: &mut Input<'_>) -> PResult<String> {
    lit("'")(input)?;
    let mut out = String::new();
    loop {
        let chunk = take_while(0.., |c: char| c != '\'').parse_next(input)?;
        out.push_str(chunk);
        lit("'")(input)?;
        if input.starts_with('\'') {
            lit("'")(input)?;
            out.push('\'');
        } else {
            break;
        }
    }
    Ok(out)
}

/// Parse a numeric literal (integer or decimal)
pub(crate) fn number(input: &mut Input<'_>) -> PResult<Decimal> {
    let text = (digit1, opt(('.', digit1))).take().parse_next(input)?;
    Decimal::from_str(text).map_err(|_| ErrMode::Cut(ContextError::new()))
}
