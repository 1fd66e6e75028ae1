//! Validated write payloads.
//!
//! An [`EntityInput`] can only be built by the validation layer, so every
//! value handed to the persistence gateway has already passed the
//! required-field and type checks for its entity.

use crate::model::records::RecordId;
use crate::model::schema::{EntityKind, FieldSpec};

/// One coerced field value, ready to bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Id(RecordId),
    /// Raw date-time text; parsed when the write is bound to the store.
    DateTime(String),
    /// Unset optional field.
    Null,
}

/// Full set of field values for one create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityInput {
    entity: EntityKind,
    values: Vec<(&'static FieldSpec, FieldValue)>,
}

impl EntityInput {
    pub(crate) fn new(entity: EntityKind, values: Vec<(&'static FieldSpec, FieldValue)>) -> Self {
        Self { entity, values }
    }

    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    /// Field values in canonical schema order.
    pub fn values(&self) -> &[(&'static FieldSpec, FieldValue)] {
        &self.values
    }

    /// Looks up a value by JSON field name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(field, _)| field.name == name)
            .map(|(_, value)| value)
    }
}
