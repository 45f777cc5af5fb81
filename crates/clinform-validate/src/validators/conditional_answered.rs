//! Conditional-answered validator

use clinform_diagnostics::{Diagnostic, IssueCode};
use clinform_model::{FieldValue, ValidatorConfig};

use crate::{FieldValidator, ValidationInput, ValidatorResult};

/// Cross-field check: a non-empty value on this field is only valid when a
/// referenced field's current (or previously submitted) answer is in the
/// configured allow-list.
///
/// Config: `referenceQuestionId` names the governing field, `answers` is the
/// allow-list of its coded answer uuids.
pub struct ConditionalAnsweredValidator;

impl FieldValidator for ConditionalAnsweredValidator {
    fn validate(
        &self,
        input: &ValidationInput<'_>,
        config: &ValidatorConfig,
    ) -> ValidatorResult<Vec<Diagnostic>> {
        if input.value.is_empty() {
            return Ok(Vec::new());
        }

        let Some(reference_id) = config.str_param("referenceQuestionId") else {
            return Ok(Vec::new());
        };
        let allowed = answer_list(config);
        if allowed.is_empty() {
            return Ok(Vec::new());
        }

        let Some(reference) = input.fields.get(reference_id) else {
            return Ok(Vec::new());
        };

        if answer_matches(&reference.value, &allowed) {
            return Ok(Vec::new());
        }
        if let Some(previous) = &reference.meta.previous_value
            && answer_matches(&previous.value, &allowed)
        {
            return Ok(Vec::new());
        }

        Ok(vec![Diagnostic::error(
            IssueCode::ConditionalAnswerMismatch,
            format!("Answer conflicts with the answer given for {}", reference.label),
        )])
    }
}

fn answer_list(config: &ValidatorConfig) -> Vec<String> {
    config
        .params
        .get("answers")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

fn answer_matches(value: &FieldValue, allowed: &[String]) -> bool {
    let uuids = value.coded_uuids();
    if !uuids.is_empty() {
        return uuids.iter().any(|u| allowed.iter().any(|a| a == u));
    }
    value
        .as_text()
        .is_some_and(|t| allowed.iter().any(|a| a == t))
}
