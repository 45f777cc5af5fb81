//! Numeric range validator

use clinform_diagnostics::{Diagnostic, IssueCode};
use clinform_model::ValidatorConfig;

use crate::validators::decimal_param;
use crate::{FieldValidator, ValidationInput, ValidatorResult};

/// Checks a numeric value against declared `min`/`max` bounds and an
/// optional `disallowDecimals` flag. Empty values pass; emptiness is the
/// required validator's concern.
pub struct NumericRangeValidator;

impl FieldValidator for NumericRangeValidator {
    fn validate(
        &self,
        input: &ValidationInput<'_>,
        config: &ValidatorConfig,
    ) -> ValidatorResult<Vec<Diagnostic>> {
        let Some(number) = input.value.as_number() else {
            return Ok(Vec::new());
        };

        let mut issues = Vec::new();

        if let Some(min) = decimal_param(config, "min")
            && number < min
        {
            issues.push(Diagnostic::error(
                IssueCode::NumericOutOfBounds,
                format!("Value must be greater than or equal to {min}"),
            ));
        }

        if let Some(max) = decimal_param(config, "max")
            && number > max
        {
            issues.push(Diagnostic::error(
                IssueCode::NumericOutOfBounds,
                format!("Value must be less than or equal to {max}"),
            ));
        }

        if config.bool_param("disallowDecimals").unwrap_or(false) && !number.is_integer() {
            issues.push(Diagnostic::error(
                IssueCode::DecimalsNotAllowed,
                "Decimal values are not allowed",
            ));
        }

        Ok(issues)
    }
}
