//! Clinical-data-entry form engine
//!
//! This crate ties the engine together:
//! - Parsing the restricted field-expression language (hide/readonly/calculate)
//! - Lazy dependency discovery between determinant fields and their dependants
//! - The visibility/readonly/calculated-value cascade
//! - The validator chain and submission assembly
//! - Value adapters translating UI values into domain payloads
//!
//! # Example
//!
//! ```
//! use clinform::model::{
//!     ConceptRef, Field, FieldType, FieldValue, Form, Page, Rendering, Section,
//!     SessionContext, SessionMode,
//! };
//! use clinform::FormSession;
//!
//! let mut form = Form::new("visit");
//! let mut page = Page::new("Visit");
//! let mut section = Section::new("Symptoms");
//! section.fields = vec!["hasFever".into(), "feverOnsetDate".into()];
//! page.sections.push(section);
//! form.add_page(page);
//!
//! form.insert_field(
//!     Field::new("hasFever", FieldType::Obs, Rendering::Toggle)
//!         .with_concept(ConceptRef::new("concept-fever"))
//!         .with_toggle("uuid-yes", "uuid-no"),
//! );
//! form.insert_field(
//!     Field::new("feverOnsetDate", FieldType::Obs, Rendering::Date)
//!         .with_concept(ConceptRef::new("concept-onset"))
//!         .with_hide("hasFever !== 'true'"),
//! );
//!
//! let mut session = FormSession::new(form, SessionContext::new(SessionMode::Enter, "person-1"));
//! session.materialize();
//! assert!(!session.is_visible("feverOnsetDate"));
//!
//! session.set_value("hasFever", FieldValue::bool(true)).unwrap();
//! assert!(session.is_visible("feverOnsetDate"));
//! ```

// Re-export all public APIs from internal crates
pub use clinform_adapters as adapters;
pub use clinform_ast as ast;
pub use clinform_diagnostics as diagnostics;
pub use clinform_eval as eval;
pub use clinform_model as model;
pub use clinform_parser as parser;
pub use clinform_validate as validate;

// Convenience re-exports
pub use clinform_ast::Expression;
pub use clinform_diagnostics::{FormError, Result};
pub use clinform_eval::{EvalValue, FormSession, SubmissionBundle, SubmitRejection};
pub use clinform_model::{Field, FieldValue, Form, SessionContext, SessionMode};
pub use clinform_parser::parse_expression;
