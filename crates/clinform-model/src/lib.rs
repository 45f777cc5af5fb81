//! Form data model
//!
//! This crate defines the materialized form tree (Form → Page → Section →
//! Field), the closed tagged value variant carried by fields, concept
//! references, submission payload wire types, session modes, and the
//! dependency graph owned by a form instance.

mod concept;
mod form;
mod graph;
mod payload;
mod session;
mod source;
mod value;

pub use concept::*;
pub use form::*;
pub use graph::*;
pub use payload::*;
pub use session::*;
pub use source::*;
pub use value::*;

/// Field identifier, unique within a materialized form instance
pub type FieldId = String;
