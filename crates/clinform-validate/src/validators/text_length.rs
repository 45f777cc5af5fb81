//! Text length validator

use clinform_diagnostics::{Diagnostic, IssueCode};
use clinform_model::{FieldValue, ScalarValue, ValidatorConfig};

use crate::validators::usize_param;
use crate::{FieldValidator, ValidationInput, ValidatorResult};

/// Checks text length against declared `minLength`/`maxLength` bounds.
///
/// Three distinct messages: too short (only a minimum declared), too long
/// (only a maximum declared), and outside both bounds (both declared).
pub struct TextLengthValidator;

impl FieldValidator for TextLengthValidator {
    fn validate(
        &self,
        input: &ValidationInput<'_>,
        config: &ValidatorConfig,
    ) -> ValidatorResult<Vec<Diagnostic>> {
        let FieldValue::Scalar(ScalarValue::Text(text)) = input.value else {
            return Ok(Vec::new());
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let length = text.chars().count();
        let min = usize_param(config, "minLength");
        let max = usize_param(config, "maxLength");

        let issue = match (min, max) {
            (Some(min), Some(max)) if length < min || length > max => Some(format!(
                "Length should be between {min} and {max} characters"
            )),
            (Some(min), None) if length < min => {
                Some(format!("Too short: minimum {min} characters"))
            }
            (None, Some(max)) if length > max => {
                Some(format!("Too long: maximum {max} characters"))
            }
            _ => None,
        };

        Ok(issue
            .map(|message| vec![Diagnostic::error(IssueCode::TextOutOfBounds, message)])
            .unwrap_or_default())
    }
}
