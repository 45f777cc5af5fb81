//! The materialized form tree: Form → Page → Section → Field
//!
//! Fields are stored flat on the form, keyed by id; pages and sections hold
//! ordered id lists. Field ids are unique across the materialized
//! (post-repeat-expansion) field list at all times.

use clinform_diagnostics::{Diagnostic, FormError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{ConceptRef, FieldId, FieldValue, PreviousValue, SubmissionValue};

/// Domain semantic of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    /// Plain observation
    Obs,
    /// Observation group (nested members)
    ObsGroup,
    /// Diagnosis
    Diagnosis,
    /// Program workflow state
    ProgramState,
    /// Patient identifier
    PatientIdentifier,
    /// Layout/control field, never submitted
    Control,
}

impl FieldType {
    /// The registry key used to resolve a value adapter
    pub const fn as_str(&self) -> &'static str {
        match self {
            FieldType::Obs => "obs",
            FieldType::ObsGroup => "obsGroup",
            FieldType::Diagnosis => "diagnosis",
            FieldType::ProgramState => "programState",
            FieldType::PatientIdentifier => "patientIdentifier",
            FieldType::Control => "control",
        }
    }
}

/// UI-shape hint for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rendering {
    /// Single-line text
    Text,
    /// Numeric input
    Number,
    /// Date input
    Date,
    /// Single coded answer (select/radio)
    CodedSingle,
    /// Multiple coded answers (checkbox)
    CodedMulti,
    /// Boolean toggle mapped to two coded answers
    Toggle,
    /// Group container
    Group,
    /// Repeating group container
    Repeat,
    /// Fixed (non-editable) value
    FixedValue,
}

/// Mapping between a toggle's boolean state and two coded answer uuids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleBinding {
    /// Coded uuid submitted when the toggle is on
    pub on: String,
    /// Coded uuid submitted when the toggle is off
    pub off: String,
}

/// One entry of a field's ordered validator list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Validator type, resolved in the validator registry
    #[serde(rename = "type")]
    pub kind: String,
    /// Validator-specific parameters
    #[serde(default)]
    pub params: serde_json::Value,
}

impl ValidatorConfig {
    /// Create a config with no parameters
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: serde_json::Value::Null,
        }
    }

    /// Create a config with parameters
    pub fn with_params(kind: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            params,
        }
    }

    /// Look up a string parameter
    pub fn str_param(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(|v| v.as_str())
    }

    /// Look up a boolean parameter
    pub fn bool_param(&self, name: &str) -> Option<bool> {
        self.params.get(name).and_then(|v| v.as_bool())
    }
}

/// Pending submission state for one field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionState {
    /// Value to submit (create or edit)
    pub new_value: Option<SubmissionValue>,
    /// Voided prior value, when the field was cleared or hidden
    pub voided_value: Option<SubmissionValue>,
    /// Explicit "not answered" marker; short-circuits validation
    pub unspecified: bool,
    /// Blocking diagnostics from the validator chain
    pub errors: Vec<Diagnostic>,
    /// Non-blocking diagnostics from the validator chain
    pub warnings: Vec<Diagnostic>,
}

/// Adapter-managed metadata for one field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMeta {
    /// Previously submitted value (edit/view modes)
    pub previous_value: Option<PreviousValue>,
    /// The persisted domain value(s) this field was loaded from
    pub initial: Option<SubmissionValue>,
    /// Pending submission state
    pub submission: SubmissionState,
}

/// A single data-entry field.
///
/// Only `id`, `fieldType` and `rendering` are required when deserializing
/// an authored definition; runtime state defaults to unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Unique id within the materialized form instance
    pub id: FieldId,
    /// Question label
    #[serde(default)]
    pub label: String,
    /// Domain semantic
    pub field_type: FieldType,
    /// UI-shape hint
    pub rendering: Rendering,
    /// Concept binding (obs-typed fields)
    #[serde(default)]
    pub concept: Option<ConceptRef>,
    /// Toggle coded mapping (toggle renderings)
    #[serde(default)]
    pub toggle: Option<ToggleBinding>,
    /// Hide expression
    #[serde(default)]
    pub hide: Option<String>,
    /// Readonly expression
    #[serde(default)]
    pub readonly: Option<String>,
    /// Calculate expression
    #[serde(default)]
    pub calculate: Option<String>,
    /// Whether an answer is required
    #[serde(default)]
    pub required: bool,
    /// Hard-disabled (degraded or authored)
    #[serde(default)]
    pub disabled: bool,
    /// Own hidden state, derived from the hide expression
    #[serde(default)]
    pub is_hidden: bool,
    /// Derived from an ancestor section/page's hidden state; never set by
    /// the field itself
    #[serde(default)]
    pub is_parent_hidden: bool,
    /// Derived from the readonly expression
    #[serde(default)]
    pub is_readonly: bool,
    /// Ordered validator configs
    #[serde(default)]
    pub validators: Vec<ValidatorConfig>,
    /// Child field ids (groups/repeats)
    #[serde(default)]
    pub children: Vec<FieldId>,
    /// For repeat clones: the template field this was cloned from
    #[serde(default)]
    pub question_id: Option<FieldId>,
    /// Current adapter-managed value
    #[serde(default)]
    pub value: FieldValue,
    /// Adapter-managed metadata
    #[serde(default)]
    pub meta: FieldMeta,
}

impl Field {
    /// Create a field with defaults
    pub fn new(id: impl Into<String>, field_type: FieldType, rendering: Rendering) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            field_type,
            rendering,
            concept: None,
            toggle: None,
            hide: None,
            readonly: None,
            calculate: None,
            required: false,
            disabled: false,
            is_hidden: false,
            is_parent_hidden: false,
            is_readonly: false,
            validators: Vec::new(),
            children: Vec::new(),
            question_id: None,
            value: FieldValue::Empty,
            meta: FieldMeta::default(),
        }
    }

    /// Set the label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the concept binding
    pub fn with_concept(mut self, concept: ConceptRef) -> Self {
        self.concept = Some(concept);
        self
    }

    /// Set the toggle coded mapping
    pub fn with_toggle(mut self, on: impl Into<String>, off: impl Into<String>) -> Self {
        self.toggle = Some(ToggleBinding {
            on: on.into(),
            off: off.into(),
        });
        self
    }

    /// Set the hide expression
    pub fn with_hide(mut self, expression: impl Into<String>) -> Self {
        self.hide = Some(expression.into());
        self
    }

    /// Set the readonly expression
    pub fn with_readonly(mut self, expression: impl Into<String>) -> Self {
        self.readonly = Some(expression.into());
        self
    }

    /// Set the calculate expression
    pub fn with_calculate(mut self, expression: impl Into<String>) -> Self {
        self.calculate = Some(expression.into());
        self
    }

    /// Mark the field required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Append a validator config
    pub fn with_validator(mut self, config: ValidatorConfig) -> Self {
        self.validators.push(config);
        self
    }

    /// Effective hidden state: own or inherited
    pub fn hidden(&self) -> bool {
        self.is_hidden || self.is_parent_hidden
    }

    /// Whether this field currently holds a persisted domain value
    pub fn has_persisted_value(&self) -> bool {
        self.meta
            .initial
            .as_ref()
            .is_some_and(SubmissionValue::has_persisted_uuid)
            || self
                .meta
                .submission
                .new_value
                .as_ref()
                .is_some_and(SubmissionValue::has_persisted_uuid)
    }
}

/// A titled group of fields within a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Identity key within the page
    pub label: String,
    /// Ordered top-level field ids
    #[serde(default)]
    pub fields: Vec<FieldId>,
    /// Hide expression
    #[serde(default)]
    pub hide: Option<String>,
    /// Derived hidden state
    #[serde(default)]
    pub is_hidden: bool,
    /// Derived from the owning page's hidden state
    #[serde(default)]
    pub is_parent_hidden: bool,
}

impl Section {
    /// Create a section
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            fields: Vec::new(),
            hide: None,
            is_hidden: false,
            is_parent_hidden: false,
        }
    }

    /// Set the hide expression
    pub fn with_hide(mut self, expression: impl Into<String>) -> Self {
        self.hide = Some(expression.into());
        self
    }

    /// Effective hidden state
    pub fn hidden(&self) -> bool {
        self.is_hidden || self.is_parent_hidden
    }
}

/// A page of sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Identity key within the form
    pub label: String,
    /// Ordered sections
    #[serde(default)]
    pub sections: Vec<Section>,
    /// Hide expression
    #[serde(default)]
    pub hide: Option<String>,
    /// Derived hidden state
    #[serde(default)]
    pub is_hidden: bool,
    /// Nested sub-form reference
    #[serde(default)]
    pub subform: Option<String>,
}

impl Page {
    /// Create a page
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            sections: Vec::new(),
            hide: None,
            is_hidden: false,
            subform: None,
        }
    }

    /// Set the hide expression
    pub fn with_hide(mut self, expression: impl Into<String>) -> Self {
        self.hide = Some(expression.into());
        self
    }
}

/// A materialized form instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    /// Form name
    pub name: String,
    /// Readonly/inline default inherited downward
    #[serde(default)]
    pub readonly: bool,
    /// Ordered pages
    #[serde(default)]
    pub pages: Vec<Page>,
    /// Flat field storage keyed by id
    #[serde(default)]
    pub fields: IndexMap<FieldId, Field>,
}

impl Form {
    /// Create an empty form
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            readonly: false,
            pages: Vec::new(),
            fields: IndexMap::new(),
        }
    }

    /// Add a page
    pub fn add_page(&mut self, page: Page) -> &mut Self {
        self.pages.push(page);
        self
    }

    /// Insert a field into flat storage
    pub fn insert_field(&mut self, field: Field) {
        self.fields.insert(field.id.clone(), field);
    }

    /// Look up a field
    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.get(id)
    }

    /// Look up a field mutably
    pub fn field_mut(&mut self, id: &str) -> Option<&mut Field> {
        self.fields.get_mut(id)
    }

    /// Find a section by label across pages
    pub fn section(&self, label: &str) -> Option<&Section> {
        self.pages
            .iter()
            .flat_map(|p| p.sections.iter())
            .find(|s| s.label == label)
    }

    /// Find a section by label, mutably
    pub fn section_mut(&mut self, label: &str) -> Option<&mut Section> {
        self.pages
            .iter_mut()
            .flat_map(|p| p.sections.iter_mut())
            .find(|s| s.label == label)
    }

    /// Find a page by label
    pub fn page(&self, label: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.label == label)
    }

    /// Find a page by label, mutably
    pub fn page_mut(&mut self, label: &str) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.label == label)
    }

    /// A field id plus all its descendants, depth-first
    pub fn descendants(&self, id: &str) -> Vec<FieldId> {
        let mut out = Vec::new();
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            if let Some(field) = self.fields.get(&current) {
                stack.extend(field.children.iter().cloned());
            }
            out.push(current);
        }
        out
    }

    /// Every field id under a section, including nested group members
    pub fn section_descendants(&self, label: &str) -> Vec<FieldId> {
        let Some(section) = self.section(label) else {
            return Vec::new();
        };
        section
            .fields
            .iter()
            .flat_map(|id| self.descendants(id))
            .collect()
    }

    /// Every field id under a page
    pub fn page_descendants(&self, label: &str) -> Vec<FieldId> {
        let Some(page) = self.page(label) else {
            return Vec::new();
        };
        page.sections
            .iter()
            .flat_map(|s| s.fields.iter())
            .flat_map(|id| self.descendants(id))
            .collect()
    }

    /// Clone a repeat template into a new instance.
    ///
    /// The clone (and its descendants) get ids of the form
    /// `<templateId>_<n>` where `n` counts existing clones, and carry the
    /// template id in `question_id`. The clone is inserted into the
    /// template's section right after the previous instance.
    pub fn expand_repeat(&mut self, template_id: &str) -> Result<FieldId> {
        let template = self
            .fields
            .get(template_id)
            .ok_or_else(|| FormError::unknown_field(template_id))?;
        if template.rendering != Rendering::Repeat {
            return Err(FormError::NotRepeating {
                id: template_id.to_string(),
            });
        }

        let instance_count = self
            .fields
            .values()
            .filter(|f| f.question_id.as_deref() == Some(template_id))
            .count();
        let suffix = instance_count + 1;

        let Some(clone_id) = self.clone_subtree(template_id, template_id, suffix) else {
            return Err(FormError::unknown_field(template_id));
        };

        // Register the clone in the section owning the template, after the
        // last existing instance.
        let instance_ids: Vec<FieldId> = self
            .fields
            .values()
            .filter(|f| f.id == template_id || f.question_id.as_deref() == Some(template_id))
            .map(|f| f.id.clone())
            .collect();
        for page in &mut self.pages {
            for section in &mut page.sections {
                if let Some(pos) = section
                    .fields
                    .iter()
                    .rposition(|id| instance_ids.contains(id) && id != &clone_id)
                {
                    section.fields.insert(pos + 1, clone_id.clone());
                    return Ok(clone_id);
                }
            }
        }
        Ok(clone_id)
    }

    /// Child ids a template lists but flat storage does not know are
    /// skipped, not cloned.
    fn clone_subtree(&mut self, id: &str, template_root: &str, suffix: usize) -> Option<FieldId> {
        let original = self.fields.get(id)?.clone();
        let clone_id = format!("{id}_{suffix}");

        let mut clone = original;
        clone.id = clone_id.clone();
        clone.question_id = Some(template_root.to_string());
        clone.value = FieldValue::Empty;
        clone.meta = FieldMeta::default();
        let child_ids = clone.children.clone();
        clone.children = child_ids
            .iter()
            .filter_map(|child| self.clone_subtree(child, template_root, suffix))
            .collect();

        self.fields.insert(clone_id.clone(), clone);
        Some(clone_id)
    }

    /// Destroy a repeat instance: the id and all descendant ids are removed
    /// from flat storage and from section field lists. Returns the removed
    /// ids so the caller can clear dependency edges and submission state.
    pub fn remove_repeat_instance(&mut self, id: &str) -> Result<Vec<FieldId>> {
        let field = self
            .fields
            .get(id)
            .ok_or_else(|| FormError::unknown_field(id))?;
        if field.question_id.is_none() {
            return Err(FormError::NotRepeating { id: id.to_string() });
        }

        let removed = self.descendants(id);
        for gone in &removed {
            self.fields.shift_remove(gone);
        }
        for page in &mut self.pages {
            for section in &mut page.sections {
                section.fields.retain(|f| !removed.contains(f));
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn repeat_form() -> Form {
        let mut form = Form::new("test");
        let mut page = Page::new("Visit");
        let mut section = Section::new("Medications");
        section.fields.push("med".into());
        page.sections.push(section);
        form.add_page(page);

        let mut template = Field::new("med", FieldType::ObsGroup, Rendering::Repeat);
        template.children = vec!["medName".into(), "medDose".into()];
        form.insert_field(template);
        form.insert_field(Field::new("medName", FieldType::Obs, Rendering::CodedSingle));
        form.insert_field(Field::new("medDose", FieldType::Obs, Rendering::Number));
        form
    }

    #[test]
    fn expand_repeat_suffixes_ids_and_tracks_origin() {
        let mut form = repeat_form();
        let clone_id = form.expand_repeat("med").unwrap();
        assert_eq!(clone_id, "med_1");

        let clone = form.field("med_1").unwrap();
        assert_eq!(clone.question_id.as_deref(), Some("med"));
        assert_eq!(clone.children, vec!["medName_1", "medDose_1"]);
        assert!(form.field("medName_1").is_some());
        assert_eq!(
            form.field("medName_1").unwrap().question_id.as_deref(),
            Some("med")
        );

        let second = form.expand_repeat("med").unwrap();
        assert_eq!(second, "med_2");
    }

    #[test]
    fn expand_repeat_skips_children_missing_from_flat_storage() {
        let mut form = repeat_form();
        form.field_mut("med").unwrap().children.push("ghost".into());

        let clone_id = form.expand_repeat("med").unwrap();
        let clone = form.field(&clone_id).unwrap();
        assert_eq!(clone.children, vec!["medName_1", "medDose_1"]);
        assert!(form.field("ghost_1").is_none());
    }

    #[test]
    fn clone_ids_stay_unique_in_field_list() {
        let mut form = repeat_form();
        form.expand_repeat("med").unwrap();
        form.expand_repeat("med").unwrap();
        let ids: Vec<&FieldId> = form.fields.keys().collect();
        let mut deduped = ids.clone();
        deduped.dedup();
        assert_eq!(ids, deduped);
    }

    #[test]
    fn remove_repeat_instance_deletes_subtree() {
        let mut form = repeat_form();
        let clone_id = form.expand_repeat("med").unwrap();
        let removed = form.remove_repeat_instance(&clone_id).unwrap();
        assert!(removed.contains(&"med_1".to_string()));
        assert!(removed.contains(&"medName_1".to_string()));
        assert!(form.field("med_1").is_none());
        assert!(form.field("medName_1").is_none());
        // template untouched
        assert!(form.field("med").is_some());
        let section = form.section("Medications").unwrap();
        assert_eq!(section.fields, vec!["med"]);
    }

    #[test]
    fn remove_rejects_non_clone() {
        let mut form = repeat_form();
        assert!(form.remove_repeat_instance("med").is_err());
    }

    #[test]
    fn section_descendants_include_nested_children() {
        let form = repeat_form();
        let mut ids = form.section_descendants("Medications");
        ids.sort();
        assert_eq!(ids, vec!["med", "medDose", "medName"]);
    }
}
