//! Default/calculated value pre-validation
//!
//! Used by the cascader to vet calculated and default values before silently
//! applying them; its diagnostics are never surfaced to the user.

use chrono::NaiveDate;
use clinform_diagnostics::{Diagnostic, IssueCode};
use clinform_model::{Field, FieldValue, Rendering, ScalarValue, ValidatorConfig};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::{FieldValidator, ValidationInput, ValidatorResult};

/// Pre-validates a candidate default value against the field's shape:
/// coded defaults must be in the answer list, date defaults must parse as
/// strict ISO-8601 dates, numeric defaults must parse as numbers.
pub struct DefaultValueValidator;

impl DefaultValueValidator {
    /// Check a candidate value against a field. Empty candidates pass.
    pub fn check(field: &Field, candidate: &FieldValue) -> Vec<Diagnostic> {
        if candidate.is_empty() {
            return Vec::new();
        }

        let rejected = |what: &str| {
            vec![Diagnostic::error(
                IssueCode::DefaultValueInvalid,
                format!("Default value rejected: {what}"),
            )]
        };

        match candidate {
            FieldValue::CodedSingle(uuid) => {
                let known = field
                    .concept
                    .as_ref()
                    .is_some_and(|c| c.has_answer(uuid));
                if !known {
                    return rejected("not in the field's answer list");
                }
            }
            FieldValue::CodedMulti(uuids) => {
                let all_known = field.concept.as_ref().is_some_and(|c| {
                    uuids.iter().all(|uuid| c.has_answer(uuid))
                });
                if !all_known {
                    return rejected("not in the field's answer list");
                }
            }
            FieldValue::Scalar(ScalarValue::Text(text)) => match field.rendering {
                Rendering::Date => {
                    if NaiveDate::parse_from_str(text, "%Y-%m-%d").is_err() {
                        return rejected("not a valid ISO-8601 date");
                    }
                }
                Rendering::Number => {
                    if Decimal::from_str(text).is_err() {
                        return rejected("not a valid number");
                    }
                }
                _ => {}
            },
            _ => {}
        }

        Vec::new()
    }
}

impl FieldValidator for DefaultValueValidator {
    fn validate(
        &self,
        input: &ValidationInput<'_>,
        _config: &ValidatorConfig,
    ) -> ValidatorResult<Vec<Diagnostic>> {
        Ok(Self::check(input.field, input.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinform_model::{ConceptAnswer, ConceptRef, FieldType};

    fn coded_field() -> Field {
        Field::new("f", FieldType::Obs, Rendering::CodedSingle).with_concept(
            ConceptRef::new("concept-1").with_answers(vec![
                ConceptAnswer::new("a1", "Answer 1"),
                ConceptAnswer::new("a2", "Answer 2"),
            ]),
        )
    }

    #[test]
    fn coded_default_must_be_a_known_answer() {
        let field = coded_field();
        assert!(DefaultValueValidator::check(&field, &FieldValue::CodedSingle("a1".into())).is_empty());
        let issues = DefaultValueValidator::check(&field, &FieldValue::CodedSingle("zz".into()));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::DefaultValueInvalid);
    }

    #[test]
    fn date_default_requires_strict_iso_parse() {
        let field = Field::new("f", FieldType::Obs, Rendering::Date);
        assert!(DefaultValueValidator::check(&field, &FieldValue::text("2026-08-27")).is_empty());
        assert_eq!(
            DefaultValueValidator::check(&field, &FieldValue::text("27/08/2026")).len(),
            1
        );
    }

    #[test]
    fn numeric_default_must_parse() {
        let field = Field::new("f", FieldType::Obs, Rendering::Number);
        assert!(DefaultValueValidator::check(&field, &FieldValue::text("42.5")).is_empty());
        assert_eq!(
            DefaultValueValidator::check(&field, &FieldValue::text("NaN")).len(),
            1
        );
    }

    #[test]
    fn empty_candidate_passes() {
        let field = coded_field();
        assert!(DefaultValueValidator::check(&field, &FieldValue::Empty).is_empty());
    }
}
