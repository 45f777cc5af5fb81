//! Date validator

use clinform_diagnostics::{Diagnostic, IssueCode};
use clinform_model::ValidatorConfig;

use crate::{FieldValidator, ValidationInput, ValidatorResult};

/// Checks date fields: an empty required date is a required error, and a
/// date strictly after "now" is rejected unless the config explicitly
/// allows future dates (`allowFutureDates`).
pub struct DateValidator;

impl FieldValidator for DateValidator {
    fn validate(
        &self,
        input: &ValidationInput<'_>,
        config: &ValidatorConfig,
    ) -> ValidatorResult<Vec<Diagnostic>> {
        if input.value.is_empty() {
            if input.field.required {
                return Ok(vec![Diagnostic::error(
                    IssueCode::FieldRequired,
                    "Field is required",
                )]);
            }
            return Ok(Vec::new());
        }

        let Some(date) = input.value.as_date() else {
            return Ok(Vec::new());
        };

        let allow_future = config.bool_param("allowFutureDates").unwrap_or(false);
        if date > input.today && !allow_future {
            return Ok(vec![Diagnostic::error(
                IssueCode::DateInFuture,
                "Future dates are not allowed",
            )]);
        }

        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use clinform_model::{Field, FieldType, FieldValue, Rendering};
    use indexmap::IndexMap;
    use serde_json::json;

    const TODAY: fn() -> NaiveDate = || NaiveDate::from_ymd_opt(2026, 8, 27).unwrap();

    fn validate(field: &Field, value: &FieldValue, params: serde_json::Value) -> Vec<Diagnostic> {
        let fields = IndexMap::new();
        let input = ValidationInput {
            field,
            value,
            fields: &fields,
            today: TODAY(),
        };
        DateValidator
            .validate(&input, &ValidatorConfig::with_params("date", params))
            .unwrap()
    }

    #[test]
    fn empty_required_date_is_a_required_error() {
        let field = Field::new("f", FieldType::Obs, Rendering::Date).required();
        let issues = validate(&field, &FieldValue::Empty, json!({}));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::FieldRequired);
    }

    #[test]
    fn future_date_rejected_by_default() {
        let field = Field::new("f", FieldType::Obs, Rendering::Date);
        let tomorrow = TODAY().succ_opt().unwrap();
        let issues = validate(&field, &FieldValue::date(tomorrow), json!({}));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::DateInFuture);
    }

    #[test]
    fn future_date_allowed_when_configured() {
        let field = Field::new("f", FieldType::Obs, Rendering::Date);
        let tomorrow = TODAY().succ_opt().unwrap();
        let issues = validate(
            &field,
            &FieldValue::date(tomorrow),
            json!({ "allowFutureDates": true }),
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn today_is_not_a_future_date() {
        let field = Field::new("f", FieldType::Obs, Rendering::Date);
        let issues = validate(&field, &FieldValue::date(TODAY()), json!({}));
        assert!(issues.is_empty());
    }
}
