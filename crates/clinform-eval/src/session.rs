//! One materialized form instance and its control flow
//!
//! A `FormSession` owns the field tree, the dependency graph, the adapter
//! and validator registries and the session context. A field-level change
//! enters through `set_value`, runs the adapter transform, the cascade and
//! the validator chain to completion, and returns synchronously. The only
//! asynchronous boundary is initial/previous-value loading, awaited once
//! before the first change.

use clinform_adapters::AdapterRegistry;
use clinform_diagnostics::{FormError, Result, Severity};
use clinform_model::{
    Dependant, DependencyGraph, DiagnosisPayload, DomainSource, Field, FieldId, FieldType,
    FieldValue, Form, ObsPayload, PatientIdentifierPayload, ProgramStatePayload, Rendering,
    SessionContext, SubmissionValue,
};
use clinform_validate::{summarize_errors, ValidationInput, ValidatorRegistry};
use indexmap::IndexMap;
use std::fmt;

use crate::cascade::{apply_value, refresh_field, run_cascade, CascadePass};
use crate::evaluator::evaluate_bool;

/// Everything the encounter-persistence collaborator receives on submit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionBundle {
    /// Observation payloads, live and voided
    pub obs: Vec<ObsPayload>,
    /// Diagnosis payloads
    pub diagnoses: Vec<DiagnosisPayload>,
    /// Program workflow states, grouped by program
    pub program_states: Vec<ProgramStatePayload>,
    /// Patient identifiers
    pub identifiers: Vec<PatientIdentifierPayload>,
}

/// Submission refused: the form-level notification of distinct error
/// categories, without per-field detail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRejection {
    /// Distinct error categories, e.g. "required fields missing"
    pub categories: Vec<String>,
}

impl fmt::Display for SubmitRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Form has errors: {}", self.categories.join(", "))
    }
}

impl std::error::Error for SubmitRejection {}

/// A materialized form instance
pub struct FormSession {
    form: Form,
    graph: DependencyGraph,
    context: SessionContext,
    adapters: AdapterRegistry,
    validators: ValidatorRegistry,
}

impl FormSession {
    /// Create a session with the standard adapter and validator registries
    pub fn new(form: Form, context: SessionContext) -> Self {
        Self {
            form,
            graph: DependencyGraph::new(),
            context,
            adapters: AdapterRegistry::with_standard_adapters(),
            validators: ValidatorRegistry::with_standard_validators(),
        }
    }

    /// Replace the adapter registry
    pub fn with_adapters(mut self, adapters: AdapterRegistry) -> Self {
        self.adapters = adapters;
        self
    }

    /// Replace the validator registry
    pub fn with_validators(mut self, validators: ValidatorRegistry) -> Self {
        self.validators = validators;
        self
    }

    /// The materialized form tree
    pub fn form(&self) -> &Form {
        &self.form
    }

    /// The dependency graph as discovered so far
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// The session context
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Look up a field
    pub fn field(&self, id: &str) -> Option<&Field> {
        self.form.field(id)
    }

    /// Whether a field is currently visible
    pub fn is_visible(&self, id: &str) -> bool {
        self.form.field(id).is_some_and(|f| !f.hidden())
    }

    /// Load saved domain data into the field tree.
    ///
    /// Awaited once per materialization, before `materialize`; the cascade
    /// itself never crosses this boundary.
    pub async fn load_initial_values(&mut self, source: &DomainSource) -> Result<()> {
        let ids: Vec<FieldId> = self.form.fields.keys().cloned().collect();
        for id in ids {
            let Some(field) = self.form.field(&id) else {
                continue;
            };
            let Some(adapter) = self.adapters.resolve(field.field_type.as_str()) else {
                continue;
            };
            let snapshot = field.clone();

            let initial = adapter
                .get_initial_value(&snapshot, source, &self.context)
                .await
                .map_err(|e| FormError::adapter(&id, e.to_string()))?;
            if let Some(initial) = initial
                && let Some(f) = self.form.field_mut(&id)
            {
                f.value = initial.value;
                f.meta.initial = initial.source;
            }

            let previous = adapter
                .get_previous_value(&snapshot, source, &self.context)
                .await
                .map_err(|e| FormError::adapter(&id, e.to_string()))?;
            if let Some(f) = self.form.field_mut(&id) {
                f.meta.previous_value = previous;
            }
        }
        Ok(())
    }

    /// Initial materialization pass.
    ///
    /// Degrades observation fields without a concept binding to a disabled
    /// text rendering, then evaluates every hide expression once against the
    /// initial values (registering dependency edges) and pushes hidden state
    /// down from pages and sections. Values are not voided here; voiding
    /// happens on later visibility flips.
    pub fn materialize(&mut self) {
        self.degrade_unbound_concepts();
        self.initial_hide_pass();

        // Readonly and calculate expressions get one initial evaluation so
        // their dependency edges exist and calculated defaults are applied.
        // Hidden states were just computed, so this cannot flip visibility.
        let ids: Vec<FieldId> = self
            .form
            .fields
            .values()
            .filter(|f| f.readonly.is_some() || f.calculate.is_some())
            .map(|f| f.id.clone())
            .collect();
        let mut pass = CascadePass::new();
        for id in ids {
            refresh_field(
                &mut self.form,
                &mut self.graph,
                &self.adapters,
                &self.context,
                &mut pass,
                &id,
            );
        }
    }

    fn degrade_unbound_concepts(&mut self) {
        for field in self.form.fields.values_mut() {
            if field.field_type == FieldType::Obs
                && field.concept.is_none()
                && field.rendering != Rendering::Text
            {
                log::warn!(
                    "field {} has no concept binding; degrading to disabled text",
                    field.id
                );
                field.rendering = Rendering::Text;
                field.disabled = true;
            }
        }
    }

    fn initial_hide_pass(&mut self) {
        let page_labels: Vec<String> = self.form.pages.iter().map(|p| p.label.clone()).collect();

        for label in &page_labels {
            let Some(page) = self.form.page(label) else {
                continue;
            };
            if let Some(expr) = page.hide.clone() {
                let hidden = evaluate_bool(
                    &expr,
                    Dependant::page(label),
                    &self.form.fields,
                    &mut self.graph,
                    &self.context,
                );
                if let Some(page) = self.form.page_mut(label) {
                    page.is_hidden = hidden;
                }
            }

            let section_labels: Vec<String> = self
                .form
                .page(label)
                .map(|p| p.sections.iter().map(|s| s.label.clone()).collect())
                .unwrap_or_default();
            let page_hidden = self.form.page(label).is_some_and(|p| p.is_hidden);

            for section_label in &section_labels {
                if let Some(expr) = self
                    .form
                    .section(section_label)
                    .and_then(|s| s.hide.clone())
                {
                    let hidden = evaluate_bool(
                        &expr,
                        Dependant::section(section_label),
                        &self.form.fields,
                        &mut self.graph,
                        &self.context,
                    );
                    if let Some(section) = self.form.section_mut(section_label) {
                        section.is_hidden = hidden;
                    }
                }
                if let Some(section) = self.form.section_mut(section_label) {
                    section.is_parent_hidden = page_hidden;
                }

                let hidden_from_above = self
                    .form
                    .section(section_label)
                    .is_some_and(|s| s.hidden());
                for id in self.form.section_descendants(section_label) {
                    if let Some(field) = self.form.field_mut(&id) {
                        field.is_parent_hidden = hidden_from_above;
                    }
                }
            }
        }

        // Field-level hide expressions, evaluated once each
        let field_ids: Vec<FieldId> = self.form.fields.keys().cloned().collect();
        for id in field_ids {
            let Some(expr) = self.form.field(&id).and_then(|f| f.hide.clone()) else {
                continue;
            };
            let hidden = evaluate_bool(
                &expr,
                Dependant::field(&id),
                &self.form.fields,
                &mut self.graph,
                &self.context,
            );
            if let Some(field) = self.form.field_mut(&id) {
                field.is_hidden = hidden;
            }
        }
    }

    /// Apply a user-entered value: adapter transform, cascade, validation.
    ///
    /// Runs to completion before returning. A no-op in view modes.
    pub fn set_value(&mut self, field_id: &str, value: FieldValue) -> Result<()> {
        if self.form.field(field_id).is_none() {
            return Err(FormError::unknown_field(field_id));
        }
        if !self.context.mode.is_mutable() {
            return Ok(());
        }

        apply_value(&mut self.form, &self.adapters, &self.context, field_id, value);

        let mut pass = CascadePass::new();
        run_cascade(
            &mut self.form,
            &mut self.graph,
            &self.adapters,
            &self.context,
            &mut pass,
            field_id,
        );

        self.validate_field(field_id);
        Ok(())
    }

    /// Run the validator chain for one field and attach its diagnostics
    pub fn validate_field(&mut self, field_id: &str) {
        let Some(field) = self.form.field(field_id) else {
            return;
        };
        let input = ValidationInput {
            field,
            value: &field.value,
            fields: &self.form.fields,
            today: self.context.today(),
        };
        let issues = self.validators.run_chain(&input);
        let (errors, warnings) = issues
            .into_iter()
            .partition(|d| d.severity == Severity::Error);
        if let Some(f) = self.form.field_mut(field_id) {
            f.meta.submission.errors = errors;
            f.meta.submission.warnings = warnings;
        }
    }

    /// Clone a repeat template into a new instance
    pub fn add_repeat(&mut self, template_id: &str) -> Result<FieldId> {
        self.form.expand_repeat(template_id)
    }

    /// Destroy a repeat instance: ids, dependency edges and submission
    /// state all go
    pub fn remove_repeat(&mut self, instance_id: &str) -> Result<Vec<FieldId>> {
        let removed = self.form.remove_repeat_instance(instance_id)?;
        for id in &removed {
            self.graph.remove_node(id);
        }
        Ok(removed)
    }

    /// Validate every visible field and assemble the submission payloads.
    ///
    /// Hidden fields contribute only their voided values. On validation
    /// failure the rejection carries the distinct error categories, without
    /// per-field detail.
    pub fn submit(&mut self) -> std::result::Result<SubmissionBundle, SubmitRejection> {
        let ids: Vec<FieldId> = self.form.fields.keys().cloned().collect();
        for id in &ids {
            if self.form.field(id).is_some_and(|f| !f.hidden()) {
                self.validate_field(id);
            }
        }

        let categories = summarize_errors(self.form.fields.values().filter(|f| !f.hidden()));
        if !categories.is_empty() {
            return Err(SubmitRejection { categories });
        }

        Ok(self.assemble_bundle())
    }

    fn assemble_bundle(&self) -> SubmissionBundle {
        let mut bundle = SubmissionBundle::default();
        let mut states_by_program: IndexMap<String, Vec<ProgramStatePayload>> = IndexMap::new();

        for field in self.form.fields.values() {
            if self.adapters.resolve(field.field_type.as_str()).is_none() {
                // Unknown type: silently absent from the payload
                continue;
            }
            let submission = &field.meta.submission;

            if !field.hidden()
                && let Some(value) = &submission.new_value
            {
                collect(value, &mut bundle, &mut states_by_program);
            }
            if let Some(value) = &submission.voided_value {
                collect(value, &mut bundle, &mut states_by_program);
            }
        }

        for (_, states) in states_by_program {
            bundle.program_states.extend(states);
        }
        bundle
    }

    /// Tear down the materialization, resetting adapter-local state
    pub fn tear_down(&mut self) {
        self.adapters.tear_down_all();
    }
}

fn collect(
    value: &SubmissionValue,
    bundle: &mut SubmissionBundle,
    states_by_program: &mut IndexMap<String, Vec<ProgramStatePayload>>,
) {
    match value {
        SubmissionValue::Obs(obs) => bundle.obs.push(obs.clone()),
        SubmissionValue::ObsList(list) => bundle.obs.extend(list.iter().cloned()),
        SubmissionValue::Diagnosis(d) => bundle.diagnoses.push(d.clone()),
        SubmissionValue::ProgramStates(states) => {
            for state in states {
                states_by_program
                    .entry(state.program.clone())
                    .or_default()
                    .push(state.clone());
            }
        }
        SubmissionValue::PatientIdentifier(p) => bundle.identifiers.push(p.clone()),
    }
}
