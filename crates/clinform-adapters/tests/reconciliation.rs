//! Multi-select reconciliation and edit round-trip behavior of the
//! observation adapter

use clinform_adapters::{ObsAdapter, ValueAdapter};
use clinform_model::{
    ConceptRef, Field, FieldType, FieldValue, ObsValue, Rendering, SessionContext, SessionMode,
    SubmissionValue,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

fn edit_context() -> SessionContext {
    SessionContext::new(SessionMode::Edit, "person-1")
}

fn symptoms_field() -> Field {
    Field::new("symptoms", FieldType::Obs, Rendering::CodedMulti)
        .with_concept(ConceptRef::new("concept-symptoms"))
}

fn transform(field: &Field, value: FieldValue) -> Vec<clinform_model::ObsPayload> {
    let outcome = ObsAdapter
        .transform_field_value(field, &value, &edit_context())
        .unwrap();
    match outcome.new_value {
        Some(SubmissionValue::ObsList(list)) => list,
        other => panic!("expected an obs list, got {other:?}"),
    }
}

#[test]
fn selecting_a_second_answer_keeps_the_first_untouched() {
    let mut field = symptoms_field();

    // Start from {a}: one persisted entry
    let first = transform(&field, FieldValue::CodedMulti(vec!["a".into()]));
    assert_eq!(first.len(), 1);
    let mut persisted_a = first[0].clone();
    persisted_a.uuid = Some("obs-a".into());
    field.meta.initial = Some(SubmissionValue::ObsList(vec![persisted_a.clone()]));

    // Select {a, b}
    let list = transform(&field, FieldValue::CodedMulti(vec!["a".into(), "b".into()]));
    assert_eq!(list.len(), 2);
    assert_eq!(list[0], persisted_a);
    assert!(!list[0].voided);
    assert_eq!(list[1].value, Some(ObsValue::coded("b")));
    assert!(list[1].uuid.is_none());
    assert!(!list[1].voided);
}

#[test]
fn deselecting_voids_the_persisted_entry_in_place() {
    let mut field = symptoms_field();
    let base = transform(&field, FieldValue::CodedMulti(vec!["a".into(), "b".into()]));
    let saved: Vec<_> = base
        .into_iter()
        .enumerate()
        .map(|(i, mut o)| {
            o.uuid = Some(format!("obs-{i}"));
            o
        })
        .collect();
    field.meta.initial = Some(SubmissionValue::ObsList(saved.clone()));

    // Back to {a}: b's entry is voided in place, a untouched
    let list = transform(&field, FieldValue::CodedMulti(vec!["a".into()]));
    assert_eq!(list.len(), 2);
    assert_eq!(list[0], saved[0]);
    assert_eq!(list[1].uuid, saved[1].uuid);
    assert!(list[1].voided);
}

#[test]
fn reselecting_a_voided_entry_unvoids_it() {
    let mut field = symptoms_field();
    let mut voided_a = transform(&field, FieldValue::CodedMulti(vec!["a".into()]))
        .pop()
        .unwrap();
    voided_a.uuid = Some("obs-a".into());
    voided_a.voided = true;
    field.meta.initial = Some(SubmissionValue::ObsList(vec![voided_a]));

    let list = transform(&field, FieldValue::CodedMulti(vec!["a".into()]));
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].uuid.as_deref(), Some("obs-a"));
    assert!(!list[0].voided);
}

#[test]
fn unsaved_deselection_is_dropped_outright() {
    let mut field = symptoms_field();
    let unsaved = transform(&field, FieldValue::CodedMulti(vec!["b".into()]));
    field.meta.initial = Some(SubmissionValue::ObsList(unsaved));

    let list = transform(&field, FieldValue::CodedMulti(vec!["a".into()]));
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].value, Some(ObsValue::coded("a")));
}

#[test]
fn identical_scalar_resubmission_round_trips_unchanged() {
    let mut field = Field::new("weight", FieldType::Obs, Rendering::Number)
        .with_concept(ConceptRef::new("concept-weight"));

    // Construct in enter mode
    let enter_ctx = SessionContext::new(SessionMode::Enter, "person-1");
    let outcome = ObsAdapter
        .transform_field_value(&field, &FieldValue::number(Decimal::from(70)), &enter_ctx)
        .unwrap();
    let Some(SubmissionValue::Obs(mut created)) = outcome.new_value else {
        panic!("expected an obs payload");
    };

    // Persist and resubmit the identical value in edit mode
    created.uuid = Some("obs-w".into());
    field.meta.initial = Some(SubmissionValue::Obs(created.clone()));

    let outcome = ObsAdapter
        .transform_field_value(&field, &FieldValue::number(Decimal::from(70)), &edit_context())
        .unwrap();
    assert_eq!(outcome.new_value, Some(SubmissionValue::Obs(created)));
    assert!(outcome.voided_value.is_none());
}
