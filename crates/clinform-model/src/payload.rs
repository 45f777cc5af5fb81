//! Submission payload wire types
//!
//! These are the domain objects handed to the encounter-persistence
//! collaborator. Field names follow the wire contract (camelCase).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::FieldValue;

/// The scalar/coded value slot of an observation payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObsValue {
    /// Coded answer uuid
    Coded(CodedRef),
    /// Numeric value
    Number(Decimal),
    /// Free text or canonical date string
    Text(String),
}

/// A coded value reference on the wire (`{"uuid": ...}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodedRef {
    /// Answer concept uuid
    pub uuid: String,
}

impl ObsValue {
    /// Construct a coded value
    pub fn coded(uuid: impl Into<String>) -> Self {
        Self::Coded(CodedRef { uuid: uuid.into() })
    }

    /// The coded uuid, if this is a coded value
    pub fn coded_uuid(&self) -> Option<&str> {
        match self {
            ObsValue::Coded(c) => Some(&c.uuid),
            _ => None,
        }
    }
}

/// Observation submission payload - the wire contract with the
/// encounter-persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObsPayload {
    /// Patient/person reference
    pub person: String,
    /// Canonical local-time timestamp
    pub obs_datetime: String,
    /// Concept uuid
    pub concept: String,
    /// Location reference
    pub location: Option<String>,
    /// Always null; orders are out of scope
    pub order: Option<String>,
    /// Nested members for obs groups
    #[serde(default)]
    pub group_members: Vec<ObsPayload>,
    /// Soft-deletion marker
    pub voided: bool,
    /// Namespace half of the correlation key
    pub form_field_namespace: String,
    /// `<namespace>-<fieldId>`, the primary correlation key on reload
    pub form_field_path: String,
    /// The scalar/coded value; None when voiding
    pub value: Option<ObsValue>,
    /// Persisted identifier; present only for saved observations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl ObsPayload {
    /// Whether this payload refers to a persisted domain record
    pub fn is_persisted(&self) -> bool {
        self.uuid.is_some()
    }
}

/// Diagnosis submission payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisPayload {
    /// Diagnosis concept uuid
    pub diagnosis: String,
    /// Certainty (`CONFIRMED` / `PROVISIONAL`)
    pub certainty: String,
    /// Rank (1 = primary)
    pub rank: i32,
    /// Soft-deletion marker
    pub voided: bool,
    /// Correlation key
    pub form_field_path: String,
    /// Persisted identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

/// Program workflow-state submission payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramStatePayload {
    /// Program uuid the state belongs to
    pub program: String,
    /// Workflow state uuid
    pub state: String,
    /// Soft-deletion marker
    pub voided: bool,
    /// Persisted identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

/// Patient identifier submission payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientIdentifierPayload {
    /// Identifier value
    pub identifier: String,
    /// Identifier type uuid
    pub identifier_type: String,
    /// Location the identifier is scoped to
    pub location: Option<String>,
    /// Soft-deletion marker
    pub voided: bool,
    /// Persisted identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

/// A pending submission value produced by a value adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmissionValue {
    /// Single observation
    Obs(ObsPayload),
    /// Observation list (multi-select renderings)
    ObsList(Vec<ObsPayload>),
    /// Diagnosis
    Diagnosis(DiagnosisPayload),
    /// Program workflow states, grouped by program
    ProgramStates(Vec<ProgramStatePayload>),
    /// Patient identifier
    PatientIdentifier(PatientIdentifierPayload),
}

impl SubmissionValue {
    /// Whether any contained payload refers to a persisted domain record
    pub fn has_persisted_uuid(&self) -> bool {
        match self {
            SubmissionValue::Obs(o) => o.uuid.is_some(),
            SubmissionValue::ObsList(list) => list.iter().any(|o| o.uuid.is_some()),
            SubmissionValue::Diagnosis(d) => d.uuid.is_some(),
            SubmissionValue::ProgramStates(list) => list.iter().any(|s| s.uuid.is_some()),
            SubmissionValue::PatientIdentifier(p) => p.uuid.is_some(),
        }
    }
}

/// A previously submitted value extracted from the domain source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviousValue {
    /// The value in field-value form
    pub value: FieldValue,
    /// Renderable display text
    pub display: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obs_payload_serializes_wire_field_names() {
        let obs = ObsPayload {
            person: "p1".into(),
            obs_datetime: "2026-01-01T10:00:00".into(),
            concept: "c1".into(),
            location: None,
            order: None,
            group_members: vec![],
            voided: false,
            form_field_namespace: "clinform".into(),
            form_field_path: "clinform-weight".into(),
            value: Some(ObsValue::Number(Decimal::from(70))),
            uuid: None,
        };
        let json = serde_json::to_value(&obs).unwrap();
        assert_eq!(json["formFieldPath"], "clinform-weight");
        assert_eq!(json["obsDatetime"], "2026-01-01T10:00:00");
        assert!(json.get("uuid").is_none());
        assert!(json["order"].is_null());
    }
}
