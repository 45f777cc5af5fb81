//! Observation adapter
//!
//! The dominant adapter: converts scalar/coded/toggle/date UI values into
//! observation payloads with create/edit/void semantics, and reconciles
//! multi-select (checkbox) renderings against a list of saved observations.

use async_trait::async_trait;
use chrono::NaiveDate;
use clinform_model::{
    DomainSource, Field, FieldValue, ObsPayload, ObsValue, PreviousValue, Rendering, ScalarValue,
    SessionContext, SubmissionValue,
};

use crate::{AdapterError, AdapterResult, InitialValue, TransformOutcome, ValueAdapter};

/// Adapter for plain observation fields
pub struct ObsAdapter;

#[async_trait]
impl ValueAdapter for ObsAdapter {
    async fn get_initial_value(
        &self,
        field: &Field,
        source: &DomainSource,
        context: &SessionContext,
    ) -> AdapterResult<Option<InitialValue>> {
        let path = context.form_field_path(&field.id);
        let concept = field.concept.as_ref().map(|c| c.uuid.as_str());
        let matches = source.obs_for_field(&path, concept);
        if matches.is_empty() {
            return Ok(None);
        }

        if field.rendering == Rendering::CodedMulti {
            let list: Vec<ObsPayload> = matches.into_iter().cloned().collect();
            let selected: Vec<String> = list
                .iter()
                .filter(|o| !o.voided)
                .filter_map(|o| o.value.as_ref().and_then(ObsValue::coded_uuid))
                .map(String::from)
                .collect();
            let value = if selected.is_empty() {
                FieldValue::Empty
            } else {
                FieldValue::CodedMulti(selected)
            };
            return Ok(Some(InitialValue {
                value,
                source: Some(SubmissionValue::ObsList(list)),
            }));
        }

        // Prefer a live observation over a voided leftover
        let payload = matches
            .iter()
            .find(|o| !o.voided)
            .copied()
            .unwrap_or(matches[0])
            .clone();
        Ok(Some(InitialValue {
            value: value_from_obs(field, &payload),
            source: Some(SubmissionValue::Obs(payload)),
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
        if field.rendering == Rendering::CodedMulti {
            return reconcile_multi(field, new_value, context);
        }

        match existing_obs(field) {
            None => {
                if new_value.is_empty() {
                    return Ok(TransformOutcome::default());
                }
                let value = obs_value_for(field, new_value)?;
                Ok(TransformOutcome::submit(SubmissionValue::Obs(new_payload(
                    field,
                    context,
                    Some(value),
                )?)))
            }
            Some(prior) => {
                if new_value.is_empty() {
                    if prior.uuid.is_none() {
                        return Ok(TransformOutcome::default());
                    }
                    let mut voided = prior.clone();
                    voided.voided = true;
                    voided.value = None;
                    return Ok(TransformOutcome::void(SubmissionValue::Obs(voided)));
                }
                let value = obs_value_for(field, new_value)?;
                if prior.value.as_ref() == Some(&value) && !prior.voided {
                    // Unchanged: return the existing object as-is
                    return Ok(TransformOutcome::submit(SubmissionValue::Obs(prior.clone())));
                }
                // Changed: mutate only the value slot
                let mut edited = prior.clone();
                edited.value = Some(value);
                edited.voided = false;
                Ok(TransformOutcome::submit(SubmissionValue::Obs(edited)))
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

/// Adapter for observation-group container fields.
///
/// Group members are ordinary observation fields that load and submit
/// themselves; the parent contributes no payload of its own. Group nesting
/// on the wire is reassembled by the submission step from the parent's
/// child list.
pub struct ObsGroupAdapter;

#[async_trait]
impl ValueAdapter for ObsGroupAdapter {
    async fn get_initial_value(
        &self,
        _field: &Field,
        _source: &DomainSource,
        _context: &SessionContext,
    ) -> AdapterResult<Option<InitialValue>> {
        Ok(None)
    }

    fn transform_field_value(
        &self,
        _field: &Field,
        _new_value: &FieldValue,
        _context: &SessionContext,
    ) -> AdapterResult<TransformOutcome> {
        Ok(TransformOutcome::default())
    }

    async fn get_previous_value(
        &self,
        _field: &Field,
        _source: &DomainSource,
        _context: &SessionContext,
    ) -> AdapterResult<Option<PreviousValue>> {
        Ok(None)
    }

    fn get_display_value(&self, _field: &Field, _value: &FieldValue) -> String {
        String::new()
    }
}

/// Build a fresh observation payload for a field
pub(crate) fn new_payload(
    field: &Field,
    context: &SessionContext,
    value: Option<ObsValue>,
) -> AdapterResult<ObsPayload> {
    let concept = field
        .concept
        .as_ref()
        .ok_or_else(|| AdapterError::MissingConcept {
            field: field.id.clone(),
        })?;
    Ok(ObsPayload {
        person: context.person.clone(),
        obs_datetime: context.obs_datetime_string(),
        concept: concept.uuid.clone(),
        location: context.location.clone(),
        order: None,
        group_members: Vec::new(),
        voided: false,
        form_field_namespace: context.namespace.clone(),
        form_field_path: context.form_field_path(&field.id),
        value,
        uuid: None,
    })
}

/// Map a UI value to the observation value slot.
///
/// Dates are normalized to a canonical local-time string; toggles map their
/// boolean state through the field's coded on/off binding.
fn obs_value_for(field: &Field, value: &FieldValue) -> AdapterResult<ObsValue> {
    match value {
        FieldValue::CodedSingle(uuid) => Ok(ObsValue::coded(uuid.clone())),
        FieldValue::Scalar(ScalarValue::Text(s)) => Ok(ObsValue::Text(s.clone())),
        FieldValue::Scalar(ScalarValue::Number(n)) => Ok(ObsValue::Number(*n)),
        FieldValue::Scalar(ScalarValue::Date(d)) => Ok(ObsValue::Text(canonical_date_string(*d))),
        FieldValue::Scalar(ScalarValue::Bool(state)) => {
            let toggle = field
                .toggle
                .as_ref()
                .ok_or_else(|| AdapterError::MissingToggleBinding {
                    field: field.id.clone(),
                })?;
            let uuid = if *state { &toggle.on } else { &toggle.off };
            Ok(ObsValue::coded(uuid.clone()))
        }
        other => Err(AdapterError::unsupported(
            &field.id,
            format!("{other:?} does not fit a single-valued observation"),
        )),
    }
}

/// Map a saved observation back to a UI value
fn value_from_obs(field: &Field, payload: &ObsPayload) -> FieldValue {
    if payload.voided {
        return FieldValue::Empty;
    }
    match &payload.value {
        None => FieldValue::Empty,
        Some(ObsValue::Number(n)) => FieldValue::number(*n),
        Some(ObsValue::Coded(coded)) => match &field.toggle {
            Some(toggle) => FieldValue::bool(coded.uuid == toggle.on),
            None => FieldValue::CodedSingle(coded.uuid.clone()),
        },
        Some(ObsValue::Text(text)) => {
            if field.rendering == Rendering::Date
                && let Some(date) = parse_canonical_date(text)
            {
                return FieldValue::date(date);
            }
            FieldValue::text(text.clone())
        }
    }
}

/// Canonical local-time form of a date value as stored on the wire
pub(crate) fn canonical_date_string(date: NaiveDate) -> String {
    format!("{}T00:00:00", date.format("%Y-%m-%d"))
}

fn parse_canonical_date(text: &str) -> Option<NaiveDate> {
    let date_part = text.get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Render a value for display, resolving coded uuids through the field's
/// concept answers
pub(crate) fn display_value(field: &Field, value: &FieldValue) -> String {
    let label = |uuid: &str| -> String {
        field
            .concept
            .as_ref()
            .and_then(|c| c.answer_label(uuid))
            .unwrap_or(uuid)
            .to_string()
    };
    match value {
        FieldValue::Empty | FieldValue::Group | FieldValue::Repeated => String::new(),
        FieldValue::Scalar(scalar) => scalar.to_string(),
        FieldValue::CodedSingle(uuid) => label(uuid),
        FieldValue::CodedMulti(items) => items
            .iter()
            .map(|u| label(u))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Reconcile a checkbox selection against the saved observation list.
///
/// Reselected entries that exist voided are un-voided; new selections get a
/// freshly constructed payload; deselected entries are voided when persisted
/// and dropped outright otherwise.
fn reconcile_multi(
    field: &Field,
    new_value: &FieldValue,
    context: &SessionContext,
) -> AdapterResult<TransformOutcome> {
    let selected: Vec<String> = match new_value {
        FieldValue::CodedMulti(items) => items.clone(),
        FieldValue::CodedSingle(uuid) => vec![uuid.clone()],
        FieldValue::Empty => Vec::new(),
        other => {
            return Err(AdapterError::unsupported(
                &field.id,
                format!("{other:?} does not fit a multi-select observation"),
            ));
        }
    };

    let existing = existing_obs_list(field);
    let mut result: Vec<ObsPayload> = Vec::new();

    for uuid in &selected {
        match existing.iter().find(|o| coded_uuid(o) == Some(uuid)) {
            Some(entry) => {
                let mut entry = entry.clone();
                entry.voided = false;
                result.push(entry);
            }
            None => {
                result.push(new_payload(field, context, Some(ObsValue::coded(uuid.clone())))?);
            }
        }
    }

    for entry in existing {
        let deselected = coded_uuid(entry).is_some_and(|u| !selected.iter().any(|s| s == u));
        if deselected && entry.uuid.is_some() {
            let mut voided = entry.clone();
            voided.voided = true;
            result.push(voided);
        }
        // Deselected entries never persisted are dropped outright
    }

    if result.is_empty() {
        return Ok(TransformOutcome::default());
    }
    Ok(TransformOutcome::submit(SubmissionValue::ObsList(result)))
}

fn coded_uuid(payload: &ObsPayload) -> Option<&str> {
    payload.value.as_ref().and_then(ObsValue::coded_uuid)
}

fn existing_obs(field: &Field) -> Option<&ObsPayload> {
    match &field.meta.initial {
        Some(SubmissionValue::Obs(payload)) => Some(payload),
        _ => None,
    }
}

fn existing_obs_list(field: &Field) -> &[ObsPayload] {
    match &field.meta.initial {
        Some(SubmissionValue::ObsList(list)) => list,
        _ => &[],
    }
}
