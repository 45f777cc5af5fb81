//! Fixed table of built-in expression functions
//!
//! The only callable surface of the expression language. Arguments arrive
//! already evaluated; identifier arguments have therefore already registered
//! their dependency edges.

use chrono::Datelike;
use clinform_model::SessionContext;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;

use crate::{EvalError, EvalResult, EvalValue};

/// A built-in function implementation
pub type BuiltinFn = fn(&[EvalValue], &SessionContext) -> EvalResult<EvalValue>;

/// The built-in function table, keyed by call name
pub static BUILTINS: Lazy<IndexMap<&'static str, BuiltinFn>> = Lazy::new(|| {
    let mut table: IndexMap<&'static str, BuiltinFn> = IndexMap::new();
    table.insert("isEmpty", is_empty);
    table.insert("includes", includes);
    table.insert("today", today);
    table.insert("isDateBefore", is_date_before);
    table.insert("isDateAfter", is_date_after);
    table.insert("yearsSince", years_since);
    table
});

fn expect_arity(
    function: &'static str,
    expected: usize,
    args: &[EvalValue],
) -> EvalResult<()> {
    if args.len() != expected {
        return Err(EvalError::Arity {
            function,
            expected,
            found: args.len(),
        });
    }
    Ok(())
}

fn is_empty(args: &[EvalValue], _ctx: &SessionContext) -> EvalResult<EvalValue> {
    expect_arity("isEmpty", 1, args)?;
    Ok(EvalValue::Bool(args[0].is_empty()))
}

fn includes(args: &[EvalValue], _ctx: &SessionContext) -> EvalResult<EvalValue> {
    expect_arity("includes", 2, args)?;
    Ok(EvalValue::Bool(args[0].contains(&args[1])))
}

fn today(args: &[EvalValue], ctx: &SessionContext) -> EvalResult<EvalValue> {
    expect_arity("today", 0, args)?;
    Ok(EvalValue::Date(ctx.today()))
}

fn date_arg(function: &'static str, value: &EvalValue) -> EvalResult<chrono::NaiveDate> {
    value.as_date().ok_or_else(|| {
        EvalError::type_mismatch(function, format!("{value} is not a date"))
    })
}

fn is_date_before(args: &[EvalValue], _ctx: &SessionContext) -> EvalResult<EvalValue> {
    expect_arity("isDateBefore", 2, args)?;
    let left = date_arg("isDateBefore", &args[0])?;
    let right = date_arg("isDateBefore", &args[1])?;
    Ok(EvalValue::Bool(left < right))
}

fn is_date_after(args: &[EvalValue], _ctx: &SessionContext) -> EvalResult<EvalValue> {
    expect_arity("isDateAfter", 2, args)?;
    let left = date_arg("isDateAfter", &args[0])?;
    let right = date_arg("isDateAfter", &args[1])?;
    Ok(EvalValue::Bool(left > right))
}

/// Whole years elapsed between a date and the session clock's today
fn years_since(args: &[EvalValue], ctx: &SessionContext) -> EvalResult<EvalValue> {
    expect_arity("yearsSince", 1, args)?;
    let from = date_arg("yearsSince", &args[0])?;
    let today = ctx.today();
    let mut years = today.year() - from.year();
    if (today.month(), today.day()) < (from.month(), from.day()) {
        years -= 1;
    }
    Ok(EvalValue::Number(Decimal::from(years)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use clinform_model::SessionMode;

    fn ctx() -> SessionContext {
        SessionContext::new(SessionMode::Enter, "person-1").with_encounter_datetime(
            NaiveDate::from_ymd_opt(2026, 8, 27)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn years_since_respects_the_anniversary() {
        let birthday = EvalValue::Date(NaiveDate::from_ymd_opt(2000, 9, 1).unwrap());
        let result = years_since(&[birthday], &ctx()).unwrap();
        assert_eq!(result, EvalValue::Number(Decimal::from(25)));

        let earlier = EvalValue::Date(NaiveDate::from_ymd_opt(2000, 8, 1).unwrap());
        let result = years_since(&[earlier], &ctx()).unwrap();
        assert_eq!(result, EvalValue::Number(Decimal::from(26)));
    }

    #[test]
    fn wrong_arity_is_a_typed_error() {
        let err = is_empty(&[], &ctx()).unwrap_err();
        assert!(matches!(err, EvalError::Arity { function: "isEmpty", .. }));
    }

    #[test]
    fn date_helpers_accept_canonical_text() {
        let a = EvalValue::Text("2026-01-01T00:00:00".into());
        let b = EvalValue::Date(NaiveDate::from_ymd_opt(2026, 6, 1).unwrap());
        assert_eq!(
            is_date_before(&[a, b], &ctx()).unwrap(),
            EvalValue::Bool(true)
        );
    }
}
