//! End-to-end behavior of a form session: dependency discovery, the
//! visibility cascade, void-on-hide and submission assembly

use clinform_eval::{FormSession, SubmitRejection};
use clinform_model::{
    ConceptRef, Dependant, DomainSource, Field, FieldType, FieldValue, Form, ObsPayload, ObsValue,
    Page, Rendering, Section, SessionContext, SessionMode,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

fn fever_field() -> Field {
    Field::new("hasFever", FieldType::Obs, Rendering::Toggle)
        .with_concept(ConceptRef::new("concept-fever"))
        .with_toggle("uuid-yes", "uuid-no")
}

fn onset_field() -> Field {
    Field::new("feverOnsetDate", FieldType::Obs, Rendering::Date)
        .with_concept(ConceptRef::new("concept-onset"))
}

/// Form where the onset date field carries its own hide expression
fn field_hide_form() -> Form {
    let mut form = Form::new("visit");
    let mut page = Page::new("Visit");
    let mut section = Section::new("Symptoms");
    section.fields = vec!["hasFever".into(), "feverOnsetDate".into()];
    page.sections.push(section);
    form.add_page(page);

    form.insert_field(fever_field());
    form.insert_field(onset_field().with_hide("hasFever !== 'true'"));
    form
}

/// Form where a whole section hides on the fever toggle
fn section_hide_form() -> Form {
    let mut form = Form::new("visit");
    let mut page = Page::new("Visit");
    let mut symptoms = Section::new("Symptoms");
    symptoms.fields = vec!["hasFever".into()];
    let mut details = Section::new("Fever details").with_hide("hasFever !== 'true'");
    details.fields = vec!["feverOnsetDate".into()];
    page.sections.push(symptoms);
    page.sections.push(details);
    form.add_page(page);

    form.insert_field(fever_field());
    form.insert_field(onset_field());
    form
}

fn saved_obs(field_path: &str, concept: &str, uuid: &str, value: ObsValue) -> ObsPayload {
    ObsPayload {
        person: "person-1".into(),
        obs_datetime: "2026-01-01T10:00:00".into(),
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

#[test]
fn hide_expression_registers_dependant_exactly_once() {
    let mut session = FormSession::new(
        field_hide_form(),
        SessionContext::new(SessionMode::Enter, "person-1"),
    );
    session.materialize();

    let dependants = session.graph().dependants_of("hasFever").unwrap();
    assert_eq!(dependants.len(), 1);
    assert!(dependants.contains(&Dependant::field("feverOnsetDate")));

    // Re-evaluation re-registers into the same set, never duplicating
    session.set_value("hasFever", FieldValue::bool(true)).unwrap();
    session.set_value("hasFever", FieldValue::bool(false)).unwrap();
    assert_eq!(session.graph().dependants_of("hasFever").unwrap().len(), 1);
}

#[test]
fn toggling_fever_shows_and_hides_the_onset_date() {
    let mut session = FormSession::new(
        field_hide_form(),
        SessionContext::new(SessionMode::Enter, "person-1"),
    );
    session.materialize();
    assert!(!session.is_visible("feverOnsetDate"));

    session.set_value("hasFever", FieldValue::bool(true)).unwrap();
    assert!(session.is_visible("feverOnsetDate"));

    session.set_value("hasFever", FieldValue::bool(false)).unwrap();
    assert!(!session.is_visible("feverOnsetDate"));
}

#[tokio::test]
async fn hiding_a_section_voids_the_persisted_descendant_value() {
    let source = DomainSource {
        obs: vec![
            saved_obs(
                "clinform-hasFever",
                "concept-fever",
                "obs-fever",
                ObsValue::coded("uuid-yes"),
            ),
            saved_obs(
                "clinform-feverOnsetDate",
                "concept-onset",
                "X",
                ObsValue::Text("2026-01-02T00:00:00".into()),
            ),
        ],
        ..Default::default()
    };

    let mut session = FormSession::new(
        section_hide_form(),
        SessionContext::new(SessionMode::Edit, "person-1"),
    );
    session.load_initial_values(&source).await.unwrap();
    session.materialize();

    // Loaded toggle is on, so the section is visible and the date is set
    assert!(session.is_visible("feverOnsetDate"));
    assert!(!session.field("feverOnsetDate").unwrap().value.is_empty());

    session.set_value("hasFever", FieldValue::bool(false)).unwrap();

    let onset = session.field("feverOnsetDate").unwrap();
    assert!(onset.is_parent_hidden);
    assert_eq!(onset.value, FieldValue::Empty);

    let bundle = session.submit().unwrap();
    let voided: Vec<&ObsPayload> = bundle
        .obs
        .iter()
        .filter(|o| o.uuid.as_deref() == Some("X"))
        .collect();
    assert_eq!(voided.len(), 1);
    assert!(voided[0].voided);
    assert!(voided[0].value.is_none());
}

#[tokio::test]
async fn re_hiding_an_already_hidden_section_changes_nothing() {
    let source = DomainSource {
        obs: vec![
            saved_obs(
                "clinform-hasFever",
                "concept-fever",
                "obs-fever",
                ObsValue::coded("uuid-yes"),
            ),
            saved_obs(
                "clinform-feverOnsetDate",
                "concept-onset",
                "X",
                ObsValue::Text("2026-01-02T00:00:00".into()),
            ),
        ],
        ..Default::default()
    };

    let mut session = FormSession::new(
        section_hide_form(),
        SessionContext::new(SessionMode::Edit, "person-1"),
    );
    session.load_initial_values(&source).await.unwrap();
    session.materialize();
    session.set_value("hasFever", FieldValue::bool(false)).unwrap();

    let snapshot = session.field("feverOnsetDate").unwrap().clone();
    session.set_value("hasFever", FieldValue::bool(false)).unwrap();
    assert_eq!(session.field("feverOnsetDate").unwrap(), &snapshot);
}

#[tokio::test]
async fn clearing_then_re_entering_submits_the_record_once() {
    let source = DomainSource {
        obs: vec![
            saved_obs(
                "clinform-hasFever",
                "concept-fever",
                "obs-fever",
                ObsValue::coded("uuid-yes"),
            ),
            saved_obs(
                "clinform-feverOnsetDate",
                "concept-onset",
                "X",
                ObsValue::Text("2026-01-02T00:00:00".into()),
            ),
        ],
        ..Default::default()
    };

    let mut session = FormSession::new(
        section_hide_form(),
        SessionContext::new(SessionMode::Edit, "person-1"),
    );
    session.load_initial_values(&source).await.unwrap();
    session.materialize();

    session.set_value("feverOnsetDate", FieldValue::Empty).unwrap();
    let corrected = chrono::NaiveDate::from_ymd_opt(2026, 2, 3).unwrap();
    session
        .set_value("feverOnsetDate", FieldValue::date(corrected))
        .unwrap();

    // The re-entered value resubmits the persisted record live; the void
    // from the intermediate clear must not ride along with it
    let bundle = session.submit().unwrap();
    let entries: Vec<&ObsPayload> = bundle
        .obs
        .iter()
        .filter(|o| o.uuid.as_deref() == Some("X"))
        .collect();
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].voided);
    assert_eq!(
        entries[0].value,
        Some(ObsValue::Text("2026-02-03T00:00:00".into()))
    );
}

#[test]
fn becoming_visible_again_does_not_restore_values() {
    let mut session = FormSession::new(
        field_hide_form(),
        SessionContext::new(SessionMode::Enter, "person-1"),
    );
    session.materialize();

    session.set_value("hasFever", FieldValue::bool(true)).unwrap();
    let date = chrono::NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
    session.set_value("feverOnsetDate", FieldValue::date(date)).unwrap();

    session.set_value("hasFever", FieldValue::bool(false)).unwrap();
    session.set_value("hasFever", FieldValue::bool(true)).unwrap();

    assert!(session.is_visible("feverOnsetDate"));
    assert_eq!(session.field("feverOnsetDate").unwrap().value, FieldValue::Empty);
}

#[test]
fn calculated_values_flow_through_the_adapter_like_user_input() {
    let mut form = Form::new("vitals");
    let mut page = Page::new("Vitals");
    let mut section = Section::new("Measurements");
    section.fields = vec!["weightKg".into(), "weightLb".into()];
    page.sections.push(section);
    form.add_page(page);

    form.insert_field(
        Field::new("weightKg", FieldType::Obs, Rendering::Number)
            .with_concept(ConceptRef::new("concept-weight-kg")),
    );
    form.insert_field(
        Field::new("weightLb", FieldType::Obs, Rendering::Number)
            .with_concept(ConceptRef::new("concept-weight-lb"))
            .with_calculate("weightKg * 2"),
    );

    let mut session = FormSession::new(form, SessionContext::new(SessionMode::Enter, "person-1"));
    session.materialize();

    session
        .set_value("weightKg", FieldValue::number(Decimal::from(70)))
        .unwrap();

    let derived = session.field("weightLb").unwrap();
    assert_eq!(derived.value, FieldValue::number(Decimal::from(140)));
    // Calculated values produce a submission payload exactly like user input
    let payload = derived.meta.submission.new_value.as_ref().unwrap();
    match payload {
        clinform_model::SubmissionValue::Obs(obs) => {
            assert_eq!(obs.value, Some(ObsValue::Number(Decimal::from(140))));
            assert_eq!(obs.form_field_path, "clinform-weightLb");
        }
        other => panic!("expected an obs payload, got {other:?}"),
    }
}

#[test]
fn mutually_referencing_hide_expressions_terminate() {
    let mut form = Form::new("loop");
    let mut page = Page::new("Loop");
    let mut section = Section::new("Loop");
    section.fields = vec!["a".into(), "b".into()];
    page.sections.push(section);
    form.add_page(page);

    form.insert_field(
        Field::new("a", FieldType::Control, Rendering::Text).with_hide("b === 'x'"),
    );
    form.insert_field(
        Field::new("b", FieldType::Control, Rendering::Text).with_hide("a === 'x'"),
    );

    let mut session = FormSession::new(form, SessionContext::new(SessionMode::Enter, "person-1"));
    session.materialize();

    // A mutual-reference cycle must not loop the cascade
    session.set_value("a", FieldValue::text("x")).unwrap();
    assert!(!session.is_visible("b"));
}

#[test]
fn submit_rejects_with_distinct_error_categories() {
    let mut form = Form::new("intake");
    let mut page = Page::new("Intake");
    let mut section = Section::new("Basics");
    section.fields = vec!["name".into(), "weightKg".into()];
    page.sections.push(section);
    form.add_page(page);

    form.insert_field(
        Field::new("name", FieldType::Obs, Rendering::Text)
            .with_concept(ConceptRef::new("concept-name"))
            .required(),
    );
    form.insert_field(
        Field::new("weightKg", FieldType::Obs, Rendering::Number)
            .with_concept(ConceptRef::new("concept-weight"))
            .with_validator(clinform_model::ValidatorConfig::with_params(
                "numericRange",
                serde_json::json!({ "min": "5", "max": "10" }),
            )),
    );

    let mut session = FormSession::new(form, SessionContext::new(SessionMode::Enter, "person-1"));
    session.materialize();
    session
        .set_value("weightKg", FieldValue::number(Decimal::from(100)))
        .unwrap();

    let rejection = session.submit().unwrap_err();
    assert_eq!(
        rejection,
        SubmitRejection {
            categories: vec![
                "required fields missing".to_string(),
                "values out of bounds".to_string(),
            ],
        }
    );
}

#[test]
fn repeat_instances_round_trip_through_the_session() {
    let mut form = Form::new("meds");
    let mut page = Page::new("Medications");
    let mut section = Section::new("Current");
    section.fields = vec!["med".into()];
    page.sections.push(section);
    form.add_page(page);

    let mut template = Field::new("med", FieldType::ObsGroup, Rendering::Repeat);
    template.children = vec!["medName".into()];
    form.insert_field(template);
    form.insert_field(
        Field::new("medName", FieldType::Obs, Rendering::Text)
            .with_concept(ConceptRef::new("concept-med-name")),
    );

    let mut session = FormSession::new(form, SessionContext::new(SessionMode::Enter, "person-1"));
    session.materialize();

    let clone_id = session.add_repeat("med").unwrap();
    assert_eq!(clone_id, "med_1");
    assert!(session.field("medName_1").is_some());

    let removed = session.remove_repeat(&clone_id).unwrap();
    assert!(removed.contains(&"medName_1".to_string()));
    assert!(session.field("medName_1").is_none());
    assert!(session.graph().dependants_of("medName_1").is_none());
}
