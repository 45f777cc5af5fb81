//! Value-adapter protocol
//!
//! A value adapter is the per-field-type strategy that converts a raw UI
//! value into a domain submission object. Each adapter supports three
//! lifecycle operations (initial-value extraction, submission transform with
//! create/edit/void semantics, previous-value extraction) plus teardown.
//! Adapters are resolved once per field through the [`AdapterRegistry`];
//! fields whose type has no registered adapter are skipped entirely during
//! rendering and submission assembly.

mod control;
mod diagnosis;
mod observation;
mod patient_identifier;
mod program_state;

pub use control::ControlAdapter;
pub use diagnosis::DiagnosisAdapter;
pub use observation::{ObsAdapter, ObsGroupAdapter};
pub use patient_identifier::PatientIdentifierAdapter;
pub use program_state::ProgramStateAdapter;

use async_trait::async_trait;
use clinform_model::{DomainSource, Field, FieldValue, PreviousValue, SessionContext, SubmissionValue};
use indexmap::IndexMap;
use std::sync::Arc;
use thiserror::Error;

/// Result type for adapter operations
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Adapter-level failure
#[derive(Debug, Error, Clone)]
pub enum AdapterError {
    /// An observation-typed field has no concept binding
    #[error("Field {field} has no concept binding")]
    MissingConcept {
        /// The offending field id
        field: String,
    },

    /// A toggle rendering has no coded on/off mapping
    #[error("Field {field} has no toggle binding")]
    MissingToggleBinding {
        /// The offending field id
        field: String,
    },

    /// The value variant does not fit the field's rendering
    #[error("Field {field} cannot accept this value: {message}")]
    UnsupportedValue {
        /// The offending field id
        field: String,
        /// What went wrong
        message: String,
    },
}

impl AdapterError {
    /// Create an unsupported-value error
    pub fn unsupported(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnsupportedValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A field's value as loaded from previously saved domain data
#[derive(Debug, Clone, PartialEq)]
pub struct InitialValue {
    /// The value in UI form
    pub value: FieldValue,
    /// The persisted domain value(s) the field was loaded from
    pub source: Option<SubmissionValue>,
}

/// Result of a submission transform.
///
/// `new_value` is the payload to create or update; `voided_value` is a prior
/// persisted payload soft-deleted by this change. Both may be absent when
/// the transform is a no-op.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformOutcome {
    /// Payload to submit (create or edit)
    pub new_value: Option<SubmissionValue>,
    /// Voided prior payload, when the change cleared a persisted value
    pub voided_value: Option<SubmissionValue>,
}

impl TransformOutcome {
    /// A transform that submits a payload
    pub fn submit(value: SubmissionValue) -> Self {
        Self {
            new_value: Some(value),
            ..Default::default()
        }
    }

    /// A transform that voids a prior payload
    pub fn void(value: SubmissionValue) -> Self {
        Self {
            voided_value: Some(value),
            ..Default::default()
        }
    }

    /// Whether the transform produced nothing
    pub fn is_noop(&self) -> bool {
        self.new_value.is_none() && self.voided_value.is_none()
    }
}

/// Per field-type strategy converting UI values to domain submission objects.
///
/// Initial- and previous-value extraction may hit asynchronous lookups and
/// are awaited once during form initialization; the transform runs
/// synchronously inside the cascade.
#[async_trait]
pub trait ValueAdapter: Send + Sync {
    /// Extract the field's value from previously saved domain data
    async fn get_initial_value(
        &self,
        field: &Field,
        source: &DomainSource,
        context: &SessionContext,
    ) -> AdapterResult<Option<InitialValue>>;

    /// Turn a raw UI value into a submission payload with create/edit/void
    /// semantics, based on the field's loaded domain value and the session
    /// mode
    fn transform_field_value(
        &self,
        field: &Field,
        new_value: &FieldValue,
        context: &SessionContext,
    ) -> AdapterResult<TransformOutcome>;

    /// Extract the previously submitted value for display alongside the field
    async fn get_previous_value(
        &self,
        field: &Field,
        source: &DomainSource,
        context: &SessionContext,
    ) -> AdapterResult<Option<PreviousValue>>;

    /// Render a value for display
    fn get_display_value(&self, field: &Field, value: &FieldValue) -> String;

    /// Reset any adapter-instance state accumulated across fields.
    ///
    /// Called when the owning form materialization is torn down.
    fn tear_down(&self) {}
}

/// Lookup from a field `type` string to one value adapter.
///
/// The engine expects exactly one adapter per type; fields with an
/// unregistered type are silently absent from rendering and submission.
pub struct AdapterRegistry {
    adapters: IndexMap<String, Arc<dyn ValueAdapter>>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_standard_adapters()
    }
}

impl AdapterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            adapters: IndexMap::new(),
        }
    }

    /// Create a registry with the built-in adapters
    pub fn with_standard_adapters() -> Self {
        let mut registry = Self::new();
        registry.register("obs", Arc::new(ObsAdapter));
        registry.register("obsGroup", Arc::new(ObsGroupAdapter));
        registry.register("diagnosis", Arc::new(DiagnosisAdapter::new()));
        registry.register("programState", Arc::new(ProgramStateAdapter));
        registry.register("patientIdentifier", Arc::new(PatientIdentifierAdapter));
        registry.register("control", Arc::new(ControlAdapter));
        registry
    }

    /// Register an adapter for a field type
    pub fn register(&mut self, field_type: impl Into<String>, adapter: Arc<dyn ValueAdapter>) {
        self.adapters.insert(field_type.into(), adapter);
    }

    /// Resolve the adapter for a field type, if one is registered
    pub fn resolve(&self, field_type: &str) -> Option<Arc<dyn ValueAdapter>> {
        let adapter = self.adapters.get(field_type).cloned();
        if adapter.is_none() {
            log::debug!("no value adapter registered for field type `{field_type}`");
        }
        adapter
    }

    /// Tear down every registered adapter
    pub fn tear_down_all(&self) {
        for adapter in self.adapters.values() {
            adapter.tear_down();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_resolves_known_types() {
        let registry = AdapterRegistry::with_standard_adapters();
        assert!(registry.resolve("obs").is_some());
        assert!(registry.resolve("diagnosis").is_some());
        assert!(registry.resolve("no-such-type").is_none());
    }
}
