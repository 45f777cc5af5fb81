//! Tree-walking expression evaluator with dependency discovery
//!
//! Identifier resolution against the live field snapshot IS the dependency
//! discovery mechanism: every field id an expression touches registers the
//! evaluating node as a dependant of that field, before the value is
//! produced. This happens on every evaluation pass, since an expression's
//! determinants can change between passes.

use clinform_ast::{BinaryExpr, BinaryOp, Expression, Literal, UnaryExpr, UnaryOp};
use clinform_model::{
    Dependant, DependencyGraph, Field, FieldId, FieldValue, Rendering, ScalarValue, SessionContext,
};
use clinform_parser::parse_expression;
use indexmap::IndexMap;
use std::cmp::Ordering;

use crate::builtins::BUILTINS;
use crate::{EvalError, EvalResult, EvalValue};

/// One expression evaluation on behalf of a dependant node
pub struct Evaluator<'a> {
    fields: &'a IndexMap<FieldId, Field>,
    graph: &'a mut DependencyGraph,
    node: Dependant,
    context: &'a SessionContext,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator for one node's expression
    pub fn new(
        fields: &'a IndexMap<FieldId, Field>,
        graph: &'a mut DependencyGraph,
        node: Dependant,
        context: &'a SessionContext,
    ) -> Self {
        Self {
            fields,
            graph,
            node,
            context,
        }
    }

    /// Parse and evaluate an expression string
    pub fn evaluate_text(&mut self, text: &str) -> EvalResult<EvalValue> {
        let expr = parse_expression(text).map_err(|e| EvalError::Parse {
            message: e.to_string(),
        })?;
        self.evaluate(&expr)
    }

    /// Evaluate a parsed expression
    pub fn evaluate(&mut self, expr: &Expression) -> EvalResult<EvalValue> {
        match expr {
            Expression::Literal(literal) => Ok(literal_value(literal)),
            Expression::Identifier(ident) => self.resolve_identifier(ident.as_str()),
            Expression::Unary(unary) => self.evaluate_unary(unary),
            Expression::Binary(binary) => self.evaluate_binary(binary),
            Expression::Call(call) => {
                let Some(builtin) = BUILTINS.get(call.name.as_str()) else {
                    return Err(EvalError::UnknownFunction {
                        name: call.name.to_string(),
                    });
                };
                let mut args = Vec::with_capacity(call.args.len());
                for arg in &call.args {
                    args.push(self.evaluate(arg)?);
                }
                builtin(&args, self.context)
            }
        }
    }

    /// Resolve a field id against the live snapshot, registering the
    /// dependency edge before producing the value
    fn resolve_identifier(&mut self, name: &str) -> EvalResult<EvalValue> {
        let Some(field) = self.fields.get(name) else {
            return Err(EvalError::UnknownIdentifier {
                name: name.to_string(),
            });
        };
        self.graph.register(name, self.node.clone());
        Ok(field_eval_value(field))
    }

    fn evaluate_unary(&mut self, unary: &UnaryExpr) -> EvalResult<EvalValue> {
        let operand = self.evaluate(&unary.operand)?;
        match unary.op {
            UnaryOp::Not => Ok(EvalValue::Bool(!operand.is_truthy())),
            UnaryOp::Negate => {
                let number = operand.as_number().ok_or_else(|| {
                    EvalError::type_mismatch("negation", format!("{operand} is not a number"))
                })?;
                Ok(EvalValue::Number(-number))
            }
        }
    }

    fn evaluate_binary(&mut self, binary: &BinaryExpr) -> EvalResult<EvalValue> {
        // Logical operators short-circuit
        match binary.op {
            BinaryOp::And => {
                let left = self.evaluate(&binary.left)?;
                if !left.is_truthy() {
                    return Ok(EvalValue::Bool(false));
                }
                let right = self.evaluate(&binary.right)?;
                return Ok(EvalValue::Bool(right.is_truthy()));
            }
            BinaryOp::Or => {
                let left = self.evaluate(&binary.left)?;
                if left.is_truthy() {
                    return Ok(EvalValue::Bool(true));
                }
                let right = self.evaluate(&binary.right)?;
                return Ok(EvalValue::Bool(right.is_truthy()));
            }
            _ => {}
        }

        let left = self.evaluate(&binary.left)?;
        let right = self.evaluate(&binary.right)?;

        match binary.op {
            BinaryOp::StrictEqual => Ok(EvalValue::Bool(left.strict_eq(&right))),
            BinaryOp::StrictNotEqual => Ok(EvalValue::Bool(!left.strict_eq(&right))),
            BinaryOp::Equal => Ok(EvalValue::Bool(left.loose_eq(&right))),
            BinaryOp::NotEqual => Ok(EvalValue::Bool(!left.loose_eq(&right))),
            BinaryOp::Less => relational(binary.op, &left, &right, Ordering::is_lt),
            BinaryOp::LessOrEqual => relational(binary.op, &left, &right, Ordering::is_le),
            BinaryOp::Greater => relational(binary.op, &left, &right, Ordering::is_gt),
            BinaryOp::GreaterOrEqual => relational(binary.op, &left, &right, Ordering::is_ge),
            BinaryOp::Add => add(&left, &right),
            BinaryOp::Subtract => arithmetic(binary.op, &left, &right, |a, b| Ok(a - b)),
            BinaryOp::Multiply => arithmetic(binary.op, &left, &right, |a, b| Ok(a * b)),
            BinaryOp::Divide => arithmetic(binary.op, &left, &right, |a, b| {
                if b.is_zero() {
                    return Err(EvalError::DivisionByZero);
                }
                Ok(a / b)
            }),
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        }
    }
}

fn literal_value(literal: &Literal) -> EvalValue {
    match literal {
        Literal::Null => EvalValue::Null,
        Literal::Boolean(b) => EvalValue::Bool(*b),
        Literal::Number(n) => EvalValue::Number(*n),
        Literal::Text(s) => EvalValue::Text(s.clone()),
    }
}

fn relational(
    op: BinaryOp,
    left: &EvalValue,
    right: &EvalValue,
    accept: fn(Ordering) -> bool,
) -> EvalResult<EvalValue> {
    match left.partial_compare(right) {
        Some(ordering) => Ok(EvalValue::Bool(accept(ordering))),
        None => Err(EvalError::type_mismatch(
            op.symbol(),
            format!("cannot compare {left} with {right}"),
        )),
    }
}

fn add(left: &EvalValue, right: &EvalValue) -> EvalResult<EvalValue> {
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return Ok(EvalValue::Number(a + b));
    }
    match (left, right) {
        (EvalValue::Text(_), _) | (_, EvalValue::Text(_)) => {
            Ok(EvalValue::Text(format!("{left}{right}")))
        }
        _ => Err(EvalError::type_mismatch(
            "+",
            format!("cannot add {left} and {right}"),
        )),
    }
}

fn arithmetic(
    op: BinaryOp,
    left: &EvalValue,
    right: &EvalValue,
    apply: fn(rust_decimal::Decimal, rust_decimal::Decimal) -> EvalResult<rust_decimal::Decimal>,
) -> EvalResult<EvalValue> {
    let (Some(a), Some(b)) = (left.as_number(), right.as_number()) else {
        return Err(EvalError::type_mismatch(
            op.symbol(),
            format!("{left} and {right} are not numbers"),
        ));
    };
    Ok(EvalValue::Number(apply(a, b)?))
}

/// The expression-level view of a field's current value.
///
/// Toggle renderings resolve to the sentinel texts `"true"`/`"false"` so
/// authored comparisons like `hasFever !== 'true'` behave bit-for-bit like
/// the original token substitution. An empty multi-select resolves to null.
pub fn field_eval_value(field: &Field) -> EvalValue {
    if field.rendering == Rendering::Toggle {
        let on = field.value.as_bool().unwrap_or(false);
        return EvalValue::Text(if on { "true" } else { "false" }.to_string());
    }
    match &field.value {
        FieldValue::Empty | FieldValue::Group | FieldValue::Repeated => EvalValue::Null,
        FieldValue::Scalar(ScalarValue::Text(s)) => EvalValue::Text(s.clone()),
        FieldValue::Scalar(ScalarValue::Number(n)) => EvalValue::Number(*n),
        FieldValue::Scalar(ScalarValue::Date(d)) => EvalValue::Date(*d),
        FieldValue::Scalar(ScalarValue::Bool(b)) => EvalValue::Bool(*b),
        FieldValue::CodedSingle(uuid) => EvalValue::Text(uuid.clone()),
        FieldValue::CodedMulti(items) => {
            if items.is_empty() {
                EvalValue::Null
            } else {
                EvalValue::List(items.iter().map(|u| EvalValue::Text(u.clone())).collect())
            }
        }
    }
}

/// Evaluate a hide/readonly-style boolean expression, absorbing any failure
/// into `false`
pub fn evaluate_bool(
    text: &str,
    node: Dependant,
    fields: &IndexMap<FieldId, Field>,
    graph: &mut DependencyGraph,
    context: &SessionContext,
) -> bool {
    let id = node.id.clone();
    match Evaluator::new(fields, graph, node, context).evaluate_text(text) {
        Ok(value) => value.is_truthy(),
        Err(e) => {
            log::warn!("expression `{text}` on {id} failed: {e}; treating as false");
            false
        }
    }
}

/// Evaluate a calculate expression, absorbing any failure into null
pub fn evaluate_calculate(
    text: &str,
    node: Dependant,
    fields: &IndexMap<FieldId, Field>,
    graph: &mut DependencyGraph,
    context: &SessionContext,
) -> EvalValue {
    let id = node.id.clone();
    match Evaluator::new(fields, graph, node, context).evaluate_text(text) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("calculate `{text}` on {id} failed: {e}; treating as empty");
            EvalValue::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinform_model::{FieldType, SessionMode};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn ctx() -> SessionContext {
        SessionContext::new(SessionMode::Enter, "person-1")
    }

    fn fields() -> IndexMap<FieldId, Field> {
        let mut map = IndexMap::new();
        let mut toggle = Field::new("hasFever", FieldType::Obs, Rendering::Toggle);
        toggle.value = FieldValue::bool(true);
        map.insert(toggle.id.clone(), toggle);

        let mut weight = Field::new("weight", FieldType::Obs, Rendering::Number);
        weight.value = FieldValue::number(Decimal::from(70));
        map.insert(weight.id.clone(), weight);

        let mut symptoms = Field::new("symptoms", FieldType::Obs, Rendering::CodedMulti);
        symptoms.value = FieldValue::CodedMulti(vec!["cough".into(), "chills".into()]);
        map.insert(symptoms.id.clone(), symptoms);
        map
    }

    fn eval(text: &str) -> EvalResult<EvalValue> {
        let fields = fields();
        let mut graph = DependencyGraph::new();
        let context = ctx();
        Evaluator::new(&fields, &mut graph, Dependant::field("probe"), &context)
            .evaluate_text(text)
    }

    #[test]
    fn toggle_resolves_to_sentinel_text() {
        assert_eq!(eval("hasFever === 'true'").unwrap(), EvalValue::Bool(true));
        assert_eq!(eval("hasFever !== 'true'").unwrap(), EvalValue::Bool(false));
    }

    #[test]
    fn arithmetic_and_comparison() {
        assert_eq!(eval("weight + 5").unwrap(), EvalValue::Number(Decimal::from(75)));
        assert_eq!(eval("weight > 25 && weight < 100").unwrap(), EvalValue::Bool(true));
    }

    #[test]
    fn division_by_zero_is_typed() {
        assert!(matches!(eval("weight / 0"), Err(EvalError::DivisionByZero)));
    }

    #[test]
    fn includes_checks_multi_select_membership() {
        assert_eq!(eval("includes(symptoms, 'cough')").unwrap(), EvalValue::Bool(true));
        assert_eq!(eval("includes(symptoms, 'rash')").unwrap(), EvalValue::Bool(false));
    }

    #[test]
    fn unknown_identifier_is_an_error_but_wrapper_defaults_false() {
        assert!(matches!(
            eval("nonsense === 1"),
            Err(EvalError::UnknownIdentifier { .. })
        ));

        let fields = fields();
        let mut graph = DependencyGraph::new();
        let context = ctx();
        assert!(!evaluate_bool(
            "nonsense === 1",
            Dependant::field("probe"),
            &fields,
            &mut graph,
            &context,
        ));
    }

    #[test]
    fn every_identifier_touch_registers_an_edge() {
        let fields = fields();
        let mut graph = DependencyGraph::new();
        let context = ctx();
        let value = Evaluator::new(
            &fields,
            &mut graph,
            Dependant::section("Vitals"),
            &context,
        )
        .evaluate_text("isEmpty(weight) || hasFever === 'true'")
        .unwrap();
        assert_eq!(value, EvalValue::Bool(true));
        assert!(graph
            .dependants_of("weight")
            .unwrap()
            .contains(&Dependant::section("Vitals")));
        assert!(graph
            .dependants_of("hasFever")
            .unwrap()
            .contains(&Dependant::section("Vitals")));
    }

    #[test]
    fn short_circuit_still_registers_touched_side_only() {
        let fields = fields();
        let mut graph = DependencyGraph::new();
        let context = ctx();
        // hasFever is 'true', so the right side never runs
        Evaluator::new(&fields, &mut graph, Dependant::field("b"), &context)
            .evaluate_text("hasFever === 'true' || weight > 100")
            .unwrap();
        assert!(graph.dependants_of("hasFever").is_some());
        assert!(graph.dependants_of("weight").is_none());
    }
}
