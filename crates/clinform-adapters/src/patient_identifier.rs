//! Patient-identifier adapter
//!
//! The field's concept binding names the identifier type; the value is the
//! identifier text. Same construct/edit/void shape as the observation
//! adapter.

use async_trait::async_trait;
use clinform_model::{
    DomainSource, Field, FieldValue, PatientIdentifierPayload, PreviousValue, SessionContext,
    SubmissionValue,
};

use crate::{AdapterError, AdapterResult, InitialValue, TransformOutcome, ValueAdapter};

/// Adapter for patient-identifier fields
pub struct PatientIdentifierAdapter;

#[async_trait]
impl ValueAdapter for PatientIdentifierAdapter {
    async fn get_initial_value(
        &self,
        field: &Field,
        source: &DomainSource,
        _context: &SessionContext,
    ) -> AdapterResult<Option<InitialValue>> {
        let identifier_type = identifier_type(field)?;
        let Some(payload) = source
            .identifiers
            .iter()
            .find(|i| i.identifier_type == identifier_type && !i.voided)
            .cloned()
        else {
            return Ok(None);
        };
        Ok(Some(InitialValue {
            value: FieldValue::text(payload.identifier.clone()),
            source: Some(SubmissionValue::PatientIdentifier(payload)),
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
            Some(SubmissionValue::PatientIdentifier(p)) => Some(p),
            _ => None,
        };

        match existing {
            None => {
                if new_value.is_empty() {
                    return Ok(TransformOutcome::default());
                }
                let identifier = identifier_text(field, new_value)?;
                Ok(TransformOutcome::submit(SubmissionValue::PatientIdentifier(
                    PatientIdentifierPayload {
                        identifier,
                        identifier_type: identifier_type(field)?,
                        location: context.location.clone(),
                        voided: false,
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
                    return Ok(TransformOutcome::void(SubmissionValue::PatientIdentifier(
                        voided,
                    )));
                }
                let identifier = identifier_text(field, new_value)?;
                if prior.identifier == identifier && !prior.voided {
                    return Ok(TransformOutcome::submit(SubmissionValue::PatientIdentifier(
                        prior.clone(),
                    )));
                }
                let mut edited = prior.clone();
                edited.identifier = identifier;
                edited.voided = false;
                Ok(TransformOutcome::submit(SubmissionValue::PatientIdentifier(
                    edited,
                )))
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

    fn get_display_value(&self, _field: &Field, value: &FieldValue) -> String {
        value.as_text().unwrap_or_default().to_string()
    }
}

fn identifier_type(field: &Field) -> AdapterResult<String> {
    field
        .concept
        .as_ref()
        .map(|c| c.uuid.clone())
        .ok_or_else(|| AdapterError::MissingConcept {
            field: field.id.clone(),
        })
}

fn identifier_text(field: &Field, value: &FieldValue) -> AdapterResult<String> {
    value
        .as_text()
        .map(String::from)
        .ok_or_else(|| AdapterError::unsupported(&field.id, "identifier values must be text"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinform_model::{ConceptRef, FieldType, Rendering, SessionMode};
    use pretty_assertions::assert_eq;

    fn field() -> Field {
        Field::new("nationalId", FieldType::PatientIdentifier, Rendering::Text)
            .with_concept(ConceptRef::new("id-type-national"))
    }

    #[test]
    fn constructs_and_then_voids_an_identifier() {
        let ctx = SessionContext::new(SessionMode::Edit, "person-1").with_location("clinic-1");
        let mut f = field();

        let outcome = PatientIdentifierAdapter
            .transform_field_value(&f, &FieldValue::text("ID-123"), &ctx)
            .unwrap();
        let Some(SubmissionValue::PatientIdentifier(created)) = outcome.new_value else {
            panic!("expected an identifier payload");
        };
        assert_eq!(created.identifier, "ID-123");
        assert_eq!(created.identifier_type, "id-type-national");
        assert_eq!(created.location.as_deref(), Some("clinic-1"));

        let mut persisted = created;
        persisted.uuid = Some("pi-1".into());
        f.meta.initial = Some(SubmissionValue::PatientIdentifier(persisted));

        let outcome = PatientIdentifierAdapter
            .transform_field_value(&f, &FieldValue::Empty, &ctx)
            .unwrap();
        let Some(SubmissionValue::PatientIdentifier(voided)) = outcome.voided_value else {
            panic!("expected a voided identifier");
        };
        assert!(voided.voided);
        assert_eq!(voided.uuid.as_deref(), Some("pi-1"));
    }
}
