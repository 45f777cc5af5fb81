//! Visibility, readonly and calculated-value cascade
//!
//! A value change on a determinant field walks its registered dependants
//! depth-first: field dependants re-evaluate hide, then readonly (only if
//! visible), then calculate (only if visible and not already computed this
//! pass); section and page dependants re-evaluate hide and push
//! `is_parent_hidden` onto their descendants when they flip. A node's edges
//! are cleared and rebuilt from the accesses its re-evaluation actually
//! makes, so stale edges do not survive a pass that re-touches the node.
//!
//! The pass carries a visited set: a determinant entered once is not entered
//! again, which bounds mutually-referencing expressions.

use clinform_adapters::AdapterRegistry;
use clinform_model::{
    Dependant, DependencyGraph, DependentKind, Field, FieldId, FieldValue, Form, Rendering,
    SessionContext,
};
use clinform_validate::DefaultValueValidator;
use indexmap::IndexSet;

use crate::evaluator::{evaluate_bool, evaluate_calculate};
use crate::EvalValue;

/// Book-keeping for one synchronous cascade pass
#[derive(Debug, Default)]
pub(crate) struct CascadePass {
    visited: IndexSet<FieldId>,
    calculated: IndexSet<FieldId>,
}

impl CascadePass {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

/// Re-evaluate everything that depends on `determinant`, recursively
pub(crate) fn run_cascade(
    form: &mut Form,
    graph: &mut DependencyGraph,
    adapters: &AdapterRegistry,
    context: &SessionContext,
    pass: &mut CascadePass,
    determinant: &str,
) {
    if !pass.visited.insert(determinant.to_string()) {
        log::debug!("cascade already visited {determinant} this pass; skipping");
        return;
    }

    let Some(dependants) = graph.dependants_of(determinant) else {
        return;
    };
    let dependants: Vec<Dependant> = dependants.iter().cloned().collect();

    for dependant in dependants {
        match dependant.kind {
            DependentKind::Field => {
                refresh_field(form, graph, adapters, context, pass, &dependant.id);
            }
            DependentKind::Section => {
                refresh_section(form, graph, adapters, context, pass, &dependant.id);
            }
            DependentKind::Page => {
                refresh_page(form, graph, adapters, context, pass, &dependant.id);
            }
        }
    }
}

pub(crate) fn refresh_field(
    form: &mut Form,
    graph: &mut DependencyGraph,
    adapters: &AdapterRegistry,
    context: &SessionContext,
    pass: &mut CascadePass,
    field_id: &str,
) {
    let Some(field) = form.field(field_id) else {
        return;
    };
    let hide_expr = field.hide.clone();
    let readonly_expr = field.readonly.clone();
    let calculate_expr = field.calculate.clone();
    let was_hidden = field.hidden();

    let node = Dependant::field(field_id);
    graph.clear_dependant(&node);

    if let Some(expr) = &hide_expr {
        let hidden = evaluate_bool(expr, node.clone(), &form.fields, graph, context);
        if let Some(f) = form.field_mut(field_id) {
            f.is_hidden = hidden;
        }
    }

    let now_hidden = form.field(field_id).is_some_and(Field::hidden);
    if now_hidden {
        if !was_hidden && void_hidden_field(form, adapters, context, field_id) {
            run_cascade(form, graph, adapters, context, pass, field_id);
        }
        return;
    }

    if let Some(expr) = &readonly_expr {
        let readonly = evaluate_bool(expr, node.clone(), &form.fields, graph, context);
        if let Some(f) = form.field_mut(field_id) {
            f.is_readonly = readonly;
        }
    }

    if let Some(expr) = &calculate_expr
        && !pass.calculated.contains(field_id)
    {
        let result = evaluate_calculate(expr, node, &form.fields, graph, context);
        let Some(field) = form.field(field_id) else {
            return;
        };
        let Some(candidate) = calculated_field_value(field, &result) else {
            return;
        };
        if candidate.is_empty() || candidate == field.value {
            return;
        }
        // Invalid calculated values are dropped silently, never applied
        if !DefaultValueValidator::check(field, &candidate).is_empty() {
            log::warn!("calculated value for {field_id} rejected by pre-validation");
            return;
        }
        pass.calculated.insert(field_id.to_string());
        if apply_value(form, adapters, context, field_id, candidate) {
            run_cascade(form, graph, adapters, context, pass, field_id);
        }
    }
}

fn refresh_section(
    form: &mut Form,
    graph: &mut DependencyGraph,
    adapters: &AdapterRegistry,
    context: &SessionContext,
    pass: &mut CascadePass,
    label: &str,
) {
    let Some(section) = form.section(label) else {
        return;
    };
    let Some(expr) = section.hide.clone() else {
        return;
    };
    let was_hidden = section.hidden();

    let node = Dependant::section(label);
    graph.clear_dependant(&node);
    let hidden = evaluate_bool(&expr, node, &form.fields, graph, context);

    let Some(section) = form.section_mut(label) else {
        return;
    };
    section.is_hidden = hidden;
    let now_hidden = section.hidden();

    if now_hidden != was_hidden {
        let descendants = form.section_descendants(label);
        set_parent_hidden(form, graph, adapters, context, pass, &descendants, now_hidden);
    }
}

fn refresh_page(
    form: &mut Form,
    graph: &mut DependencyGraph,
    adapters: &AdapterRegistry,
    context: &SessionContext,
    pass: &mut CascadePass,
    label: &str,
) {
    let Some(page) = form.page(label) else {
        return;
    };
    let Some(expr) = page.hide.clone() else {
        return;
    };
    let was_hidden = page.is_hidden;

    let node = Dependant::page(label);
    graph.clear_dependant(&node);
    let hidden = evaluate_bool(&expr, node, &form.fields, graph, context);

    let Some(page) = form.page_mut(label) else {
        return;
    };
    page.is_hidden = hidden;

    if hidden != was_hidden {
        for section in &mut page.sections {
            section.is_parent_hidden = hidden;
        }
        let descendants = form.page_descendants(label);
        set_parent_hidden(form, graph, adapters, context, pass, &descendants, hidden);
    }
}

/// Push an ancestor's hidden state onto descendant fields.
///
/// A flip to hidden voids each newly hidden field's persisted value; a flip
/// to visible only clears the flag, values are not restored.
fn set_parent_hidden(
    form: &mut Form,
    graph: &mut DependencyGraph,
    adapters: &AdapterRegistry,
    context: &SessionContext,
    pass: &mut CascadePass,
    field_ids: &[FieldId],
    hidden: bool,
) {
    for id in field_ids {
        let Some(field) = form.field_mut(id) else {
            continue;
        };
        let was_hidden = field.hidden();
        field.is_parent_hidden = hidden;
        let now_hidden = field.hidden();

        if now_hidden && !was_hidden && void_hidden_field(form, adapters, context, id) {
            run_cascade(form, graph, adapters, context, pass, id);
        }
    }
}

/// Clear a newly hidden field, voiding any persisted value through its
/// adapter. Returns whether anything changed.
fn void_hidden_field(
    form: &mut Form,
    adapters: &AdapterRegistry,
    context: &SessionContext,
    field_id: &str,
) -> bool {
    let Some(field) = form.field(field_id) else {
        return false;
    };
    if field.value.is_empty() && field.meta.submission.new_value.is_none() {
        return false;
    }

    if field.has_persisted_value() {
        return apply_value(form, adapters, context, field_id, FieldValue::Empty);
    }

    // Never persisted: just drop the pending state
    if let Some(f) = form.field_mut(field_id) {
        f.value = FieldValue::Empty;
        f.meta.submission.new_value = None;
    }
    true
}

/// Route a value through the field's adapter and store the outcome, exactly
/// as if the user had entered it. Returns whether the field changed.
pub(crate) fn apply_value(
    form: &mut Form,
    adapters: &AdapterRegistry,
    context: &SessionContext,
    field_id: &str,
    value: FieldValue,
) -> bool {
    let Some(field) = form.field(field_id) else {
        return false;
    };

    let Some(adapter) = adapters.resolve(field.field_type.as_str()) else {
        // No adapter: the value still participates in expressions but is
        // absent from the submission payload
        if let Some(f) = form.field_mut(field_id) {
            f.value = value;
        }
        return true;
    };

    let snapshot = field.clone();
    match adapter.transform_field_value(&snapshot, &value, context) {
        Ok(outcome) => {
            let Some(f) = form.field_mut(field_id) else {
                return false;
            };
            f.value = value;
            // The transform owns both slots: re-entering a value after a
            // clear resubmits the persisted record live, so a void recorded
            // by the earlier change must not survive alongside it.
            f.meta.submission.new_value = outcome.new_value;
            f.meta.submission.voided_value = outcome.voided_value;
            true
        }
        Err(e) => {
            log::warn!("adapter transform failed on {field_id}: {e}");
            false
        }
    }
}

/// Shape a calculate result to the field's rendering
fn calculated_field_value(field: &Field, value: &EvalValue) -> Option<FieldValue> {
    if matches!(value, EvalValue::Null) {
        return None;
    }
    match field.rendering {
        Rendering::Number => value.as_number().map(FieldValue::number),
        Rendering::Date => value.as_date().map(FieldValue::date),
        Rendering::Toggle => Some(FieldValue::bool(value.is_truthy())),
        Rendering::CodedSingle => match value {
            EvalValue::Text(uuid) => Some(FieldValue::CodedSingle(uuid.clone())),
            _ => None,
        },
        Rendering::CodedMulti => match value {
            EvalValue::List(items) => Some(FieldValue::CodedMulti(
                items.iter().map(ToString::to_string).collect(),
            )),
            EvalValue::Text(uuid) => Some(FieldValue::CodedMulti(vec![uuid.clone()])),
            _ => None,
        },
        _ => Some(FieldValue::text(value.to_string())),
    }
}
