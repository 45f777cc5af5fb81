//! Form engine diagnostics and error handling
//!
//! This crate provides the error handling infrastructure shared across the
//! form engine: issue codes, per-field diagnostics produced by validators,
//! and the top-level error type.

mod error;
mod issue;

pub use error::*;
pub use issue::*;

/// Result type for form engine operations
pub type Result<T> = std::result::Result<T, FormError>;
