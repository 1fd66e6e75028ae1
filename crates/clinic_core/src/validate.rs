//! Write validation for untyped request bodies.
//!
//! # Responsibility
//! - Check a JSON body against the entity schema before any store access.
//! - Coerce accepted values into an [`EntityInput`].
//!
//! # Invariants
//! - Only write paths validate; reads never produce a `ValidationError`.
//! - Required fields must be present, non-null and non-blank.
//! - Foreign-key fields must be integer-coercible: integers, whole-number
//!   floats, or strings holding either.
//! - Date-time content is not parsed here; the gateway rejects unparsable
//!   values when binding the write.
//! - Email and phone values are never format-checked.

use crate::model::input::{EntityInput, FieldValue};
use crate::model::schema::{EntityKind, FieldSpec, FieldType};
use serde_json::{Map, Number, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Reason a write body was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Body is not a JSON object.
    NotAnObject {
        entity: EntityKind,
        found: &'static str,
    },
    /// Body names a field the entity does not have.
    UnknownField { entity: EntityKind, field: String },
    /// Body tries to set the store-assigned identifier.
    AssignedId { entity: EntityKind },
    /// Both a field and its alias were supplied.
    DuplicateField {
        entity: EntityKind,
        field: &'static str,
    },
    MissingField {
        entity: EntityKind,
        field: &'static str,
    },
    EmptyField {
        entity: EntityKind,
        field: &'static str,
    },
    WrongType {
        entity: EntityKind,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    NotAnInteger {
        entity: EntityKind,
        field: &'static str,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject { entity, found } => {
                write!(f, "{entity} body must be a JSON object, got {found}")
            }
            Self::UnknownField { entity, field } => {
                write!(f, "unknown field `{field}` for {entity}")
            }
            Self::AssignedId { entity } => {
                write!(f, "{entity} id is assigned by the store and cannot be set")
            }
            Self::DuplicateField { entity, field } => {
                write!(f, "field `{field}` for {entity} was supplied more than once")
            }
            Self::MissingField { entity, field } => {
                write!(f, "missing required field `{field}` for {entity}")
            }
            Self::EmptyField { entity, field } => {
                write!(f, "required field `{field}` for {entity} must not be empty")
            }
            Self::WrongType {
                entity,
                field,
                expected,
                found,
            } => write!(
                f,
                "field `{field}` for {entity} must be a {expected}, got {found}"
            ),
            Self::NotAnInteger { entity, field } => {
                write!(f, "field `{field}` for {entity} must be an integer id")
            }
        }
    }
}

impl Error for ValidationError {}

/// Validates a create/update body for `entity`.
///
/// Updates replace the full record, so the same rules apply to both; an
/// optional field left out of an update body is cleared.
pub fn validate_write(entity: EntityKind, body: &Value) -> ValidationResult<EntityInput> {
    let object = body.as_object().ok_or(ValidationError::NotAnObject {
        entity,
        found: json_type_name(body),
    })?;

    for key in object.keys() {
        if key == "id" {
            return Err(ValidationError::AssignedId { entity });
        }
        if entity.field(key).is_none() {
            return Err(ValidationError::UnknownField {
                entity,
                field: key.clone(),
            });
        }
    }

    let mut values = Vec::with_capacity(entity.fields().len());
    for field in entity.fields() {
        let raw = lookup(entity, object, field)?;
        values.push((field, coerce(entity, field, raw)?));
    }

    Ok(EntityInput::new(entity, values))
}

fn lookup<'a>(
    entity: EntityKind,
    object: &'a Map<String, Value>,
    field: &'static FieldSpec,
) -> ValidationResult<Option<&'a Value>> {
    let primary = object.get(field.name);
    let aliased = field.alias.and_then(|alias| object.get(alias));
    match (primary, aliased) {
        (Some(_), Some(_)) => Err(ValidationError::DuplicateField {
            entity,
            field: field.name,
        }),
        (Some(value), None) | (None, Some(value)) => Ok(Some(value)),
        (None, None) => Ok(None),
    }
}

fn coerce(
    entity: EntityKind,
    field: &'static FieldSpec,
    raw: Option<&Value>,
) -> ValidationResult<FieldValue> {
    let value = match raw {
        None | Some(Value::Null) => return unset(entity, field),
        Some(value) => value,
    };

    match (field.ty, value) {
        (FieldType::Text, Value::String(text)) => {
            if text.trim().is_empty() {
                unset(entity, field).map_err(|_| empty(entity, field))
            } else {
                Ok(FieldValue::Text(text.clone()))
            }
        }
        (FieldType::DateTime, Value::String(text)) => {
            if text.trim().is_empty() {
                unset(entity, field).map_err(|_| empty(entity, field))
            } else {
                Ok(FieldValue::DateTime(text.clone()))
            }
        }
        (FieldType::ForeignKey(_), Value::Number(number)) => number_to_id(number)
            .map(FieldValue::Id)
            .ok_or(ValidationError::NotAnInteger {
                entity,
                field: field.name,
            }),
        (FieldType::ForeignKey(_), Value::String(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return unset(entity, field).map_err(|_| empty(entity, field));
            }
            text_to_id(trimmed)
                .map(FieldValue::Id)
                .ok_or(ValidationError::NotAnInteger {
                    entity,
                    field: field.name,
                })
        }
        (ty, other) => Err(ValidationError::WrongType {
            entity,
            field: field.name,
            expected: ty.type_name(),
            found: json_type_name(other),
        }),
    }
}

/// Converts a JSON number to an id when it is a whole number within `i64`.
pub(crate) fn number_to_id(number: &Number) -> Option<i64> {
    number
        .as_i64()
        .or_else(|| number.as_f64().and_then(whole_to_id))
}

/// Parses `"12"` or `"12.0"` as an id; surrounding whitespace is ignored.
pub(crate) fn text_to_id(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().and_then(whole_to_id))
}

fn whole_to_id(value: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.is_finite() && value.fract() == 0.0 && in_range).then_some(value as i64)
}

fn unset(entity: EntityKind, field: &'static FieldSpec) -> ValidationResult<FieldValue> {
    if field.required {
        Err(ValidationError::MissingField {
            entity,
            field: field.name,
        })
    } else {
        Ok(FieldValue::Null)
    }
}

fn empty(entity: EntityKind, field: &'static FieldSpec) -> ValidationError {
    ValidationError::EmptyField {
        entity,
        field: field.name,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
