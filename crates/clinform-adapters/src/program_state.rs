//! Program workflow-state adapter
//!
//! The field's concept binding names the program; the selected coded answer
//! is the workflow state. Changing state voids the prior state entry and
//! appends a fresh one, keeping all entries for the same program grouped in
//! one submission list.

use async_trait::async_trait;
use clinform_model::{
    DomainSource, Field, FieldValue, PreviousValue, ProgramStatePayload, SessionContext,
    SubmissionValue,
};

use crate::observation::display_value;
use crate::{AdapterError, AdapterResult, InitialValue, TransformOutcome, ValueAdapter};

/// Adapter for program workflow-state fields
pub struct ProgramStateAdapter;

#[async_trait]
impl ValueAdapter for ProgramStateAdapter {
    async fn get_initial_value(
        &self,
        field: &Field,
        source: &DomainSource,
        _context: &SessionContext,
    ) -> AdapterResult<Option<InitialValue>> {
        let program = program_uuid(field)?;
        let entries: Vec<ProgramStatePayload> = source
            .program_states
            .iter()
            .filter(|s| s.program == program)
            .cloned()
            .collect();
        if entries.is_empty() {
            return Ok(None);
        }
        let value = entries
            .iter()
            .find(|s| !s.voided)
            .map(|s| FieldValue::CodedSingle(s.state.clone()))
            .unwrap_or_default();
        Ok(Some(InitialValue {
            value,
            source: Some(SubmissionValue::ProgramStates(entries)),
        }))
    }

    fn transform_field_value(
        &self,
        field: &Field,
        new_value: &FieldValue,
        context: &SessionContext,
    ) -> AdapterResult<TransformOutcome> {
        if !context.mode.is_mutable() {
            return Ok(TransformOutcome::default());
        }
        let program = program_uuid(field)?;

        let existing: Vec<ProgramStatePayload> = match &field.meta.initial {
            Some(SubmissionValue::ProgramStates(list)) => list.clone(),
            _ => Vec::new(),
        };
        let current = existing.iter().find(|s| !s.voided);

        let selected = match new_value {
            FieldValue::Empty => None,
            FieldValue::CodedSingle(state) => Some(state.clone()),
            other => {
                return Err(AdapterError::unsupported(
                    &field.id,
                    format!("{other:?} does not fit a workflow state"),
                ));
            }
        };

        match (current, selected) {
            (None, None) => Ok(TransformOutcome::default()),
            (None, Some(state)) => {
                let mut result = existing;
                result.push(ProgramStatePayload {
                    program,
                    state,
                    voided: false,
                    uuid: None,
                });
                Ok(TransformOutcome::submit(SubmissionValue::ProgramStates(
                    result,
                )))
            }
            (Some(live), Some(state)) if live.state == state => {
                // Unchanged
                Ok(TransformOutcome::submit(SubmissionValue::ProgramStates(
                    existing,
                )))
            }
            (Some(_), selected) => {
                let mut result: Vec<ProgramStatePayload> = Vec::new();
                let mut voided_any = false;
                for mut entry in existing {
                    if !entry.voided {
                        if entry.uuid.is_some() {
                            entry.voided = true;
                            voided_any = true;
                            result.push(entry);
                        }
                        // Unsaved live entries are replaced outright
                    } else {
                        result.push(entry);
                    }
                }
                if let Some(state) = selected {
                    result.push(ProgramStatePayload {
                        program,
                        state,
                        voided: false,
                        uuid: None,
                    });
                    return Ok(TransformOutcome::submit(SubmissionValue::ProgramStates(
                        result,
                    )));
                }
                if voided_any {
                    return Ok(TransformOutcome::void(SubmissionValue::ProgramStates(
                        result,
                    )));
                }
                Ok(TransformOutcome::default())
            }
        }
    }

    async fn get_previous_value(
        &self,
        field: &Field,
        source: &DomainSource,
        context: &SessionContext,
    ) -> AdapterResult<Option<PreviousValue>> {
        let Some(initial) = self.get_initial_value(field, source, context).await? else {
            return Ok(None);
        };
        if initial.value.is_empty() {
            return Ok(None);
        }
        let display = self.get_display_value(field, &initial.value);
        Ok(Some(PreviousValue {
            value: initial.value,
            display,
        }))
    }

    fn get_display_value(&self, field: &Field, value: &FieldValue) -> String {
        display_value(field, value)
    }
}

fn program_uuid(field: &Field) -> AdapterResult<String> {
    field
        .concept
        .as_ref()
        .map(|c| c.uuid.clone())
        .ok_or_else(|| AdapterError::MissingConcept {
            field: field.id.clone(),
        })
}
