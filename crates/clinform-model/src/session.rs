//! Session modes and the per-materialization context

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Session mode consumed throughout the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionMode {
    /// New form, no prior domain object
    Enter,
    /// Prior domain object present; void-on-delete semantics active
    Edit,
    /// Read-only, no adapter mutation
    View,
    /// Read-only, rendered inside another view
    EmbeddedView,
}

impl SessionMode {
    /// Whether adapters may mutate submission state in this mode
    pub const fn is_mutable(&self) -> bool {
        matches!(self, SessionMode::Enter | SessionMode::Edit)
    }

    /// Whether a prior domain object is expected
    pub const fn is_edit(&self) -> bool {
        matches!(self, SessionMode::Edit)
    }
}

/// Context for one form materialization: session mode, patient record and
/// the namespace used to derive `formFieldPath` correlation keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Session mode
    pub mode: SessionMode,
    /// Patient/person reference
    pub person: String,
    /// Encounter location reference
    pub location: Option<String>,
    /// Encounter timestamp, local time
    pub encounter_datetime: NaiveDateTime,
    /// Namespace prefix for formFieldPath
    pub namespace: String,
}

impl SessionContext {
    /// Create a context with the default namespace
    pub fn new(mode: SessionMode, person: impl Into<String>) -> Self {
        Self {
            mode,
            person: person.into(),
            location: None,
            encounter_datetime: chrono::Local::now().naive_local(),
            namespace: "clinform".to_string(),
        }
    }

    /// Set the encounter location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the encounter timestamp
    pub fn with_encounter_datetime(mut self, at: NaiveDateTime) -> Self {
        self.encounter_datetime = at;
        self
    }

    /// The stable correlation key for a field: `<namespace>-<fieldId>`
    pub fn form_field_path(&self, field_id: &str) -> String {
        format!("{}-{}", self.namespace, field_id)
    }

    /// Canonical local-time string used when storing obs timestamps
    pub fn obs_datetime_string(&self) -> String {
        self.encounter_datetime
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string()
    }

    /// Today's date, from the encounter clock
    pub fn today(&self) -> NaiveDate {
        self.encounter_datetime.date()
    }
}
