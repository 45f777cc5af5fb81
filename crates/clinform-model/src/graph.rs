//! Dependency graph between determinant fields and their dependants
//!
//! Edges are owned by the form instance as an explicit adjacency map, not
//! attached to mutable field objects. They are discovered lazily: an edge
//! exists only after the owning expression has been evaluated at least once.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::FieldId;

/// What kind of node depends on a determinant field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependentKind {
    /// A field's hide/readonly/calculate expression
    Field,
    /// A section's hide expression
    Section,
    /// A page's hide expression
    Page,
}

/// A dependant node: target identity plus kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependant {
    /// Field id / section label / page label
    pub id: String,
    /// Node kind
    pub kind: DependentKind,
}

impl Dependant {
    /// A field dependant
    pub fn field(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: DependentKind::Field,
        }
    }

    /// A section dependant
    pub fn section(label: impl Into<String>) -> Self {
        Self {
            id: label.into(),
            kind: DependentKind::Section,
        }
    }

    /// A page dependant
    pub fn page(label: impl Into<String>) -> Self {
        Self {
            id: label.into(),
            kind: DependentKind::Page,
        }
    }
}

/// Directed dependency edges: determinant field id → dependant nodes.
///
/// Set semantics dedupe re-registration; insertion order is preserved but
/// carries no meaning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyGraph {
    edges: IndexMap<FieldId, IndexSet<Dependant>>,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `dependant`'s expression read `determinant`'s value
    pub fn register(&mut self, determinant: &str, dependant: Dependant) {
        self.edges
            .entry(determinant.to_string())
            .or_default()
            .insert(dependant);
    }

    /// All dependants registered against a determinant field
    pub fn dependants_of(&self, determinant: &str) -> Option<&IndexSet<Dependant>> {
        self.edges.get(determinant)
    }

    /// Remove every edge pointing at `dependant`, across all determinants.
    ///
    /// Called before a node's expressions are re-evaluated so the pass
    /// rebuilds its edges from the accesses it actually makes; stale edges
    /// do not survive.
    pub fn clear_dependant(&mut self, dependant: &Dependant) {
        for set in self.edges.values_mut() {
            set.shift_remove(dependant);
        }
        self.edges.retain(|_, set| !set.is_empty());
    }

    /// Remove a determinant and all its outgoing edges, and remove the same
    /// id wherever it appears as a field dependant. Used when a repeat
    /// instance is destroyed.
    pub fn remove_node(&mut self, field_id: &str) {
        self.edges.shift_remove(field_id);
        let gone = Dependant::field(field_id);
        self.clear_dependant(&gone);
    }

    /// Number of determinants with at least one edge
    pub fn determinant_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether the graph has no edges
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
