//! Concept references - external, read-only input to the engine

use serde::{Deserialize, Serialize};

/// A coded answer on a concept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptAnswer {
    /// Answer concept uuid
    pub uuid: String,
    /// Display label
    pub label: String,
}

impl ConceptAnswer {
    /// Create a new answer
    pub fn new(uuid: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            label: label.into(),
        }
    }
}

/// An opaque concept binding, possibly with a fixed list of coded answers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptRef {
    /// Concept uuid
    pub uuid: String,
    /// Display name
    pub display: Option<String>,
    /// Coded answers for coded renderings
    #[serde(default)]
    pub answers: Vec<ConceptAnswer>,
}

impl ConceptRef {
    /// Create a concept reference with no answers
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            display: None,
            answers: Vec::new(),
        }
    }

    /// Attach coded answers
    pub fn with_answers(mut self, answers: Vec<ConceptAnswer>) -> Self {
        self.answers = answers;
        self
    }

    /// Whether the given uuid is one of this concept's answers
    pub fn has_answer(&self, uuid: &str) -> bool {
        self.answers.iter().any(|a| a.uuid == uuid)
    }

    /// Resolve an answer uuid to its display label
    pub fn answer_label(&self, uuid: &str) -> Option<&str> {
        self.answers
            .iter()
            .find(|a| a.uuid == uuid)
            .map(|a| a.label.as_str())
    }
}
