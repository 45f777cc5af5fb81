//! Validator registry and chain runner

use clinform_diagnostics::{Diagnostic, IssueCode};
use clinform_model::{Field, ValidatorConfig};
use indexmap::{IndexMap, IndexSet};

use crate::validators::{
    ConditionalAnsweredValidator, DateValidator, DefaultValueValidator, NumericRangeValidator,
    RequiredValidator, TextLengthValidator,
};
use crate::{FieldValidator, ValidationInput};

/// Lookup from validator `type` string to one implementation
pub struct ValidatorRegistry {
    validators: IndexMap<String, Box<dyn FieldValidator>>,
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::with_standard_validators()
    }
}

impl ValidatorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            validators: IndexMap::new(),
        }
    }

    /// Create a registry with the built-in validators
    pub fn with_standard_validators() -> Self {
        let mut registry = Self::new();
        registry.register("required", Box::new(RequiredValidator));
        registry.register("numericRange", Box::new(NumericRangeValidator));
        registry.register("textLength", Box::new(TextLengthValidator));
        registry.register("date", Box::new(DateValidator));
        registry.register("default", Box::new(DefaultValueValidator));
        registry.register("conditionalAnswered", Box::new(ConditionalAnsweredValidator));
        registry
    }

    /// Register a validator implementation
    pub fn register(&mut self, kind: impl Into<String>, validator: Box<dyn FieldValidator>) {
        self.validators.insert(kind.into(), validator);
    }

    /// Run the full chain for a field.
    ///
    /// An `unspecified` submission short-circuits to no diagnostics. The
    /// implicit required check runs for any field flagged required, then the
    /// field's configured validators in order. Unknown validator types are
    /// skipped. A validator fault becomes one blocking `internal.error`
    /// diagnostic (fail-closed) and is logged. Duplicate diagnostics from
    /// overlapping validators are collapsed.
    pub fn run_chain(&self, input: &ValidationInput<'_>) -> Vec<Diagnostic> {
        if input.field.meta.submission.unspecified {
            return Vec::new();
        }

        let mut issues: Vec<Diagnostic> = Vec::new();

        if input.field.required {
            self.run_one(input, &ValidatorConfig::new("required"), &mut issues);
        }

        for config in &input.field.validators {
            self.run_one(input, config, &mut issues);
        }

        dedupe(issues)
    }

    fn run_one(
        &self,
        input: &ValidationInput<'_>,
        config: &ValidatorConfig,
        issues: &mut Vec<Diagnostic>,
    ) {
        let Some(validator) = self.validators.get(&config.kind) else {
            log::debug!(
                "skipping unknown validator type `{}` on field {}",
                config.kind,
                input.field.id
            );
            return;
        };
        match validator.validate(input, config) {
            Ok(results) => issues.extend(results),
            Err(e) => {
                log::warn!(
                    "validator `{}` failed on field {}: {e}",
                    config.kind,
                    input.field.id
                );
                issues.push(Diagnostic::error(
                    IssueCode::InternalError,
                    format!("Validation could not be completed: {e}"),
                ));
            }
        }
    }
}

fn dedupe(issues: Vec<Diagnostic>) -> Vec<Diagnostic> {
    let mut seen = IndexSet::new();
    issues
        .into_iter()
        .filter(|d| seen.insert((d.code, d.message.clone())))
        .collect()
}

/// Aggregate the distinct error categories across all fields, for the
/// form-level notification. No per-field detail is included.
pub fn summarize_errors<'a>(fields: impl IntoIterator<Item = &'a Field>) -> Vec<String> {
    let mut categories: IndexSet<&'static str> = IndexSet::new();
    for field in fields {
        for issue in &field.meta.submission.errors {
            categories.insert(issue.code.category());
        }
    }
    categories.into_iter().map(String::from).collect()
}
