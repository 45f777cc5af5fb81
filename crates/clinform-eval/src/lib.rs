//! Conditional-logic and dependency-evaluation core
//!
//! This crate is the engine behind dynamic clinical-data-entry forms: it
//! evaluates per-field hide/readonly/calculate expressions against the live
//! value snapshot, discovers which fields each expression depends on,
//! propagates visibility and computed-value changes to dependants when a
//! determinant changes, and routes values through the value-adapter
//! protocol. Everything runs synchronously inside a change event; failures
//! in authored expressions degrade to safe defaults instead of aborting a
//! pass.

mod builtins;
mod cascade;
mod error;
mod evaluator;
mod session;
mod value;

pub use builtins::{BuiltinFn, BUILTINS};
pub use error::{EvalError, EvalResult};
pub use evaluator::{evaluate_bool, evaluate_calculate, field_eval_value, Evaluator};
pub use session::{FormSession, SubmissionBundle, SubmitRejection};
pub use value::EvalValue;
