//! Diagnosis adapter
//!
//! Follows the observation adapter's construct/edit/void shape with a
//! diagnosis-specific payload (certainty and rank). The adapter keeps an
//! instance-scoped accumulator of saved-diagnosis uuids already claimed by a
//! field, so repeated instances of the same diagnosis question each pick a
//! distinct saved record when path correlation misses. The accumulator is
//! reset by `tear_down`.

use async_trait::async_trait;
use clinform_model::{
    DiagnosisPayload, DomainSource, Field, FieldValue, PreviousValue, SessionContext,
    SubmissionValue,
};
use indexmap::IndexSet;
use std::sync::Mutex;

use crate::observation::display_value;
use crate::{AdapterError, AdapterResult, InitialValue, TransformOutcome, ValueAdapter};

const CERTAINTY: &str = "CONFIRMED";

/// Adapter for diagnosis fields
pub struct DiagnosisAdapter {
    claimed: Mutex<IndexSet<String>>,
}

impl Default for DiagnosisAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosisAdapter {
    /// Create an adapter with an empty claimed set
    pub fn new() -> Self {
        Self {
            claimed: Mutex::new(IndexSet::new()),
        }
    }

    fn claim(&self, uuid: &str) -> bool {
        self.claimed
            .lock()
            .map(|mut set| set.insert(uuid.to_string()))
            .unwrap_or(false)
    }

    fn is_claimed(&self, uuid: &str) -> bool {
        self.claimed
            .lock()
            .map(|set| set.contains(uuid))
            .unwrap_or(false)
    }
}

#[async_trait]
impl ValueAdapter for DiagnosisAdapter {
    async fn get_initial_value(
        &self,
        field: &Field,
        source: &DomainSource,
        context: &SessionContext,
    ) -> AdapterResult<Option<InitialValue>> {
        let path = context.form_field_path(&field.id);
        let by_path = source.diagnoses_for_field(&path);

        // Path correlation first; otherwise the next unclaimed saved
        // diagnosis, so clones of the same question each get their own.
        let candidate = by_path
            .into_iter()
            .find(|d| !d.voided)
            .or_else(|| {
                source
                    .diagnoses
                    .iter()
                    .find(|d| !d.voided && d.uuid.as_deref().is_some_and(|u| !self.is_claimed(u)))
            })
            .cloned();

        let Some(payload) = candidate else {
            return Ok(None);
        };
        if let Some(uuid) = payload.uuid.as_deref() {
            self.claim(uuid);
        }
        Ok(Some(InitialValue {
            value: FieldValue::CodedSingle(payload.diagnosis.clone()),
            source: Some(SubmissionValue::Diagnosis(payload)),
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

        let existing = match &field.meta.initial {
            Some(SubmissionValue::Diagnosis(d)) => Some(d),
            _ => None,
        };

        match existing {
            None => {
                if new_value.is_empty() {
                    return Ok(TransformOutcome::default());
                }
                let diagnosis = diagnosis_uuid(field, new_value)?;
                Ok(TransformOutcome::submit(SubmissionValue::Diagnosis(
                    DiagnosisPayload {
                        diagnosis,
                        certainty: CERTAINTY.into(),
                        rank: rank_for(field),
                        voided: false,
                        form_field_path: context.form_field_path(&field.id),
                        uuid: None,
                    },
                )))
            }
            Some(prior) => {
                if new_value.is_empty() {
                    if prior.uuid.is_none() {
                        return Ok(TransformOutcome::default());
                    }
                    let mut voided = prior.clone();
                    voided.voided = true;
                    return Ok(TransformOutcome::void(SubmissionValue::Diagnosis(voided)));
                }
                let diagnosis = diagnosis_uuid(field, new_value)?;
                if prior.diagnosis == diagnosis && !prior.voided {
                    return Ok(TransformOutcome::submit(SubmissionValue::Diagnosis(
                        prior.clone(),
                    )));
                }
                let mut edited = prior.clone();
                edited.diagnosis = diagnosis;
                edited.voided = false;
                Ok(TransformOutcome::submit(SubmissionValue::Diagnosis(edited)))
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
        let display = self.get_display_value(field, &initial.value);
        Ok(Some(PreviousValue {
            value: initial.value,
            display,
        }))
    }

    fn get_display_value(&self, field: &Field, value: &FieldValue) -> String {
        display_value(field, value)
    }

    fn tear_down(&self) {
        if let Ok(mut set) = self.claimed.lock() {
            set.clear();
        }
    }
}

/// Primary diagnosis on the template, secondary on repeat clones
fn rank_for(field: &Field) -> i32 {
    if field.question_id.is_none() { 1 } else { 2 }
}

fn diagnosis_uuid(field: &Field, value: &FieldValue) -> AdapterResult<String> {
    match value {
        FieldValue::CodedSingle(uuid) => Ok(uuid.clone()),
        other => Err(AdapterError::unsupported(
            &field.id,
            format!("{other:?} does not fit a diagnosis"),
        )),
    }
}
