//! End-to-end engine test through the facade crate: an edit-mode visit
//! form is loaded from saved domain data, changed, and submitted.

use chrono::NaiveDate;
use clinform::model::{
    ConceptRef, DomainSource, Field, FieldType, FieldValue, Form, ObsPayload, ObsValue, Page,
    Rendering, Section, SessionContext, SessionMode,
};
use clinform::FormSession;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

fn visit_form() -> Form {
    let mut form = Form::new("visit");
    let mut page = Page::new("Visit");
    let mut section = Section::new("Vitals");
    section.fields = vec!["weightKg".into(), "weightLb".into(), "followUpDate".into()];
    page.sections.push(section);
    form.add_page(page);

    form.insert_field(
        Field::new("weightKg", FieldType::Obs, Rendering::Number)
            .with_concept(ConceptRef::new("concept-weight-kg"))
            .required(),
    );
    form.insert_field(
        Field::new("weightLb", FieldType::Obs, Rendering::Number)
            .with_concept(ConceptRef::new("concept-weight-lb"))
            .with_readonly("weightKg")
            .with_calculate("weightKg * 2"),
    );
    form.insert_field(
        Field::new("followUpDate", FieldType::Obs, Rendering::Date)
            .with_concept(ConceptRef::new("concept-follow-up")),
    );
    form
}

fn saved_obs(field_path: &str, concept: &str, uuid: &str, value: ObsValue) -> ObsPayload {
    ObsPayload {
        person: "person-1".into(),
        obs_datetime: "2026-02-01T09:30:00".into(),
        concept: concept.into(),
        location: None,
        order: None,
        group_members: vec![],
        voided: false,
        form_field_namespace: "clinform".into(),
        form_field_path: field_path.into(),
        value: Some(value),
        uuid: Some(uuid.into()),
    }
}

#[tokio::test]
async fn edit_round_trip_updates_in_place_and_voids_cleared_values() {
    let source = DomainSource {
        obs: vec![
            saved_obs(
                "clinform-weightKg",
                "concept-weight-kg",
                "obs-kg",
                ObsValue::Number(Decimal::from(70)),
            ),
            saved_obs(
                "clinform-followUpDate",
                "concept-follow-up",
                "obs-date",
                ObsValue::Text("2026-03-01T00:00:00".into()),
            ),
        ],
        ..Default::default()
    };

    let mut session = FormSession::new(
        visit_form(),
        SessionContext::new(SessionMode::Edit, "person-1"),
    );
    session.load_initial_values(&source).await.unwrap();
    session.materialize();

    assert_eq!(
        session.field("weightKg").unwrap().value,
        FieldValue::number(Decimal::from(70))
    );
    assert_eq!(
        session.field("followUpDate").unwrap().value,
        FieldValue::date(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
    );
    // The previous value is kept alongside, for display
    let previous = session
        .field("weightKg")
        .unwrap()
        .meta
        .previous_value
        .as_ref()
        .unwrap();
    assert_eq!(previous.display, "70");

    // The calculated conversion applied at materialization and its
    // determinant made it readonly
    assert_eq!(
        session.field("weightLb").unwrap().value,
        FieldValue::number(Decimal::from(140))
    );
    assert!(session.field("weightLb").unwrap().is_readonly);

    // Change the weight, clear the follow-up date
    session
        .set_value("weightKg", FieldValue::number(Decimal::from(72)))
        .unwrap();
    session.set_value("followUpDate", FieldValue::Empty).unwrap();

    let bundle = session.submit().unwrap();

    let kg = bundle
        .obs
        .iter()
        .find(|o| o.uuid.as_deref() == Some("obs-kg"))
        .unwrap();
    assert!(!kg.voided);
    assert_eq!(kg.value, Some(ObsValue::Number(Decimal::from(72))));

    let date = bundle
        .obs
        .iter()
        .find(|o| o.uuid.as_deref() == Some("obs-date"))
        .unwrap();
    assert!(date.voided);
    assert!(date.value.is_none());

    // The recalculated conversion submits as a fresh observation
    let lb = bundle
        .obs
        .iter()
        .find(|o| o.form_field_path == "clinform-weightLb")
        .unwrap();
    assert!(lb.uuid.is_none());
    assert_eq!(lb.value, Some(ObsValue::Number(Decimal::from(144))));

    session.tear_down();
}

#[test]
fn form_definitions_deserialize_from_authored_json() {
    let json = serde_json::json!({
        "name": "visit",
        "pages": [{
            "label": "Visit",
            "sections": [{
                "label": "Symptoms",
                "fields": ["hasFever", "feverOnsetDate"]
            }]
        }],
        "fields": {
            "hasFever": {
                "id": "hasFever",
                "fieldType": "obs",
                "rendering": "toggle",
                "concept": { "uuid": "concept-fever" },
                "toggle": { "on": "uuid-yes", "off": "uuid-no" }
            },
            "feverOnsetDate": {
                "id": "feverOnsetDate",
                "fieldType": "obs",
                "rendering": "date",
                "concept": { "uuid": "concept-onset" },
                "hide": "hasFever !== 'true'"
            }
        }
    });

    let form: Form = serde_json::from_value(json).unwrap();
    let mut session = FormSession::new(form, SessionContext::new(SessionMode::Enter, "person-1"));
    session.materialize();

    assert!(!session.is_visible("feverOnsetDate"));
    session.set_value("hasFever", FieldValue::bool(true)).unwrap();
    assert!(session.is_visible("feverOnsetDate"));
}
