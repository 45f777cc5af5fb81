//! Required-field validator

use clinform_diagnostics::{Diagnostic, IssueCode};
use clinform_model::ValidatorConfig;

use crate::{FieldValidator, ValidationInput, ValidatorResult};

/// Rejects empty values on required fields.
///
/// Empty means: no value, whitespace-only text, or an empty coded selection.
pub struct RequiredValidator;

impl FieldValidator for RequiredValidator {
    fn validate(
        &self,
        input: &ValidationInput<'_>,
        _config: &ValidatorConfig,
    ) -> ValidatorResult<Vec<Diagnostic>> {
        if !input.field.required {
            return Ok(Vec::new());
        }
        if input.value.is_empty() {
            return Ok(vec![Diagnostic::error(
                IssueCode::FieldRequired,
                "Field is required",
            )]);
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinform_model::{Field, FieldType, FieldValue, Rendering};
    use indexmap::IndexMap;

    fn validate(field: &Field, value: &FieldValue) -> Vec<Diagnostic> {
        let fields = IndexMap::new();
        let input = ValidationInput {
            field,
            value,
            fields: &fields,
            today: chrono::NaiveDate::from_ymd_opt(2026, 8, 27).unwrap(),
        };
        RequiredValidator
            .validate(&input, &ValidatorConfig::new("required"))
            .unwrap()
    }

    #[test]
    fn empty_value_on_required_field_yields_exactly_one_error() {
        let field = Field::new("f", FieldType::Obs, Rendering::Text).required();
        let issues = validate(&field, &FieldValue::text(""));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::FieldRequired);
    }

    #[test]
    fn whitespace_only_text_counts_as_empty() {
        let field = Field::new("f", FieldType::Obs, Rendering::Text).required();
        assert_eq!(validate(&field, &FieldValue::text("   ")).len(), 1);
    }

    #[test]
    fn present_value_passes() {
        let field = Field::new("f", FieldType::Obs, Rendering::Text).required();
        assert!(validate(&field, &FieldValue::text("x")).is_empty());
    }

    #[test]
    fn optional_field_is_never_flagged() {
        let field = Field::new("f", FieldType::Obs, Rendering::Text);
        assert!(validate(&field, &FieldValue::Empty).is_empty());
    }
}
