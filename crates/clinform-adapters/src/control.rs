//! Control adapter - no-op for layout fields that never submit

use async_trait::async_trait;
use clinform_model::{DomainSource, Field, FieldValue, PreviousValue, SessionContext};

use crate::{AdapterResult, InitialValue, TransformOutcome, ValueAdapter};

/// Adapter for control/layout fields
pub struct ControlAdapter;

#[async_trait]
impl ValueAdapter for ControlAdapter {
    async fn get_initial_value(
        &self,
        _field: &Field,
        _source: &DomainSource,
        _context: &SessionContext,
    ) -> AdapterResult<Option<InitialValue>> {
        Ok(None)
    }

    fn transform_field_value(
        &self,
        _field: &Field,
        _new_value: &FieldValue,
        _context: &SessionContext,
    ) -> AdapterResult<TransformOutcome> {
        Ok(TransformOutcome::default())
    }

    async fn get_previous_value(
        &self,
        _field: &Field,
        _source: &DomainSource,
        _context: &SessionContext,
    ) -> AdapterResult<Option<PreviousValue>> {
        Ok(None)
    }

    fn get_display_value(&self, _field: &Field, _value: &FieldValue) -> String {
        String::new()
    }
}
