//! OpenAPI component schemas derived from the entity schema.

use crate::model::schema::{EntityKind, FieldType};
use serde_json::{json, Map, Value};

pub const API_TITLE: &str = "Healthcare Management API";
pub const API_VERSION: &str = "1.0.0";

/// Builds `components.schemas`, one object schema per entity.
pub fn component_schemas() -> Value {
    let schemas = EntityKind::ALL
        .into_iter()
        .map(|entity| (entity.label().to_string(), entity_schema(entity)))
        .collect::<Map<_, _>>();
    Value::Object(schemas)
}

/// Wraps [`component_schemas`] in a minimal OpenAPI 3 document.
pub fn openapi_document() -> Value {
    json!({
        "openapi": "3.0.0",
        "info": {
            "title": API_TITLE,
            "version": API_VERSION,
            "description": "API documentation for Healthcare Management System",
        },
        "paths": {},
        "components": { "schemas": component_schemas() },
    })
}

fn entity_schema(entity: EntityKind) -> Value {
    let mut properties = Map::new();
    for field in entity.fields() {
        let mut property = match field.ty {
            FieldType::Text => json!({ "type": "string" }),
            FieldType::ForeignKey(_) => json!({ "type": "integer" }),
            FieldType::DateTime => json!({ "type": "string", "format": "date-time" }),
        };
        if !field.required {
            property["nullable"] = Value::Bool(true);
        }
        properties.insert(field.name.to_string(), property);
    }

    let required = entity
        .required_fields()
        .map(|field| Value::String(field.name.to_string()))
        .collect::<Vec<_>>();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}
