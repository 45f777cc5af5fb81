//! Domain source objects - previously saved encounter data used for
//! initial- and previous-value extraction in edit/view modes

use serde::{Deserialize, Serialize};

use crate::{DiagnosisPayload, ObsPayload, PatientIdentifierPayload, ProgramStatePayload};

/// The previously persisted encounter data a form is re-loaded against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainSource {
    /// Saved observations
    #[serde(default)]
    pub obs: Vec<ObsPayload>,
    /// Saved diagnoses
    #[serde(default)]
    pub diagnoses: Vec<DiagnosisPayload>,
    /// Saved program workflow states
    #[serde(default)]
    pub program_states: Vec<ProgramStatePayload>,
    /// Saved patient identifiers
    #[serde(default)]
    pub identifiers: Vec<PatientIdentifierPayload>,
}

impl DomainSource {
    /// Find saved observations correlated to a field.
    ///
    /// Primary correlation is by `formFieldPath`; when no path matches, falls
    /// back to correlation by concept uuid.
    pub fn obs_for_field<'a>(
        &'a self,
        form_field_path: &str,
        concept: Option<&str>,
    ) -> Vec<&'a ObsPayload> {
        let by_path: Vec<&ObsPayload> = self
            .obs
            .iter()
            .filter(|o| o.form_field_path == form_field_path)
            .collect();
        if !by_path.is_empty() {
            return by_path;
        }
        match concept {
            Some(concept) => self.obs.iter().filter(|o| o.concept == concept).collect(),
            None => Vec::new(),
        }
    }

    /// Find saved diagnoses correlated by `formFieldPath`
    pub fn diagnoses_for_field<'a>(&'a self, form_field_path: &str) -> Vec<&'a DiagnosisPayload> {
        self.diagnoses
            .iter()
            .filter(|d| d.form_field_path == form_field_path)
            .collect()
    }
}
