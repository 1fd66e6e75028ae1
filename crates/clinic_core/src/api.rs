//! Transport boundary for REST-shaped requests.
//!
//! # Responsibility
//! - Route `(method, path)` pairs to record service operations.
//! - Map service results and error kinds to status codes and JSON bodies.
//!
//! # Invariants
//! - Only operations the service exposes are routable; anything else is
//!   `404 route not found`.
//! - Path identifiers follow the same integer coercion as foreign keys;
//!   anything else resolves to `404 <Entity> not found`.
//! - Failures are mapped once and never retried.

use crate::error::{ErrorKind, RecordError};
use crate::model::schema::EntityKind;
use crate::service::record_service::RecordService;
use crate::validate::text_to_id;
use log::error;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub const STATUS_OK: u16 = 200;
pub const STATUS_CREATED: u16 = 201;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl FromStr for Method {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            other => Err(format!(
                "unsupported method `{other}`; expected GET|POST|PUT|DELETE"
            )),
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        })
    }
}

/// One inbound request; `body` is the parsed JSON payload, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Status code plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn json(status: u16, payload: &impl Serialize) -> Self {
        match serde_json::to_value(payload) {
            Ok(body) => Self { status, body },
            Err(err) => {
                error!(
                    "event=api_respond module=api status=error error_code=serialize_failed error={err}"
                );
                Self::error(STATUS_INTERNAL_ERROR, "failed to serialize response")
            }
        }
    }

    pub(crate) fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    pub(crate) fn not_found(entity: EntityKind) -> Self {
        Self::error(STATUS_NOT_FOUND, format!("{entity} not found"))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// URL collection segment for each entity.
fn collection(entity: EntityKind) -> &'static str {
    match entity {
        EntityKind::Doctor => "doctors",
        EntityKind::Patient => "patients",
        EntityKind::Appointment => "appointments",
        EntityKind::Prescription => "prescriptions",
        EntityKind::Clinic => "clinics",
        EntityKind::Department => "departments",
        EntityKind::DoctorClinic => "doctor-clinics",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

/// Dispatches one request against the record service.
pub fn handle(service: &RecordService, request: &ApiRequest) -> ApiResponse {
    let segments = request
        .path
        .trim_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>();

    let (entity, raw_id) = match segments.as_slice() {
        [name] => (entity_for(name), None),
        [name, id] => (entity_for(name), Some(*id)),
        _ => (None, None),
    };
    let Some(entity) = entity else {
        return route_not_found();
    };

    let operation = match (request.method, raw_id.is_some()) {
        (Method::Get, false) => Operation::List,
        (Method::Post, false) => Operation::Create,
        (Method::Get, true) => Operation::Get,
        (Method::Put, true) => Operation::Update,
        (Method::Delete, true) => Operation::Delete,
        _ => return route_not_found(),
    };

    let id = match raw_id.map(text_to_id) {
        Some(Some(id)) => Some(id),
        Some(None) if is_routable(entity, operation) => {
            return ApiResponse::not_found(entity);
        }
        Some(None) => return route_not_found(),
        None => None,
    };

    let null = Value::Null;
    let body = request.body.as_ref().unwrap_or(&null);

    use EntityKind as E;
    use Operation as O;
    match (entity, operation, id) {
        (E::Doctor, O::List, _) => ok(service.list_doctors()),
        (E::Doctor, O::Get, Some(id)) => ok(service.get_doctor(id)),
        (E::Doctor, O::Create, _) => created(service.create_doctor(body)),
        (E::Doctor, O::Update, Some(id)) => ok(service.update_doctor(id, body)),
        (E::Doctor, O::Delete, Some(id)) => deleted(entity, service.delete_doctor(id)),

        (E::Patient, O::List, _) => ok(service.list_patients()),
        (E::Patient, O::Get, Some(id)) => ok(service.get_patient(id)),
        (E::Patient, O::Create, _) => created(service.create_patient(body)),
        (E::Patient, O::Update, Some(id)) => ok(service.update_patient(id, body)),
        (E::Patient, O::Delete, Some(id)) => deleted(entity, service.delete_patient(id)),

        (E::Appointment, O::List, _) => ok(service.list_appointments()),
        (E::Appointment, O::Create, _) => created(service.create_appointment(body)),

        (E::Prescription, O::List, _) => ok(service.list_prescriptions()),
        (E::Prescription, O::Create, _) => created(service.create_prescription(body)),

        (E::Clinic, O::List, _) => ok(service.list_clinics()),
        (E::Clinic, O::Create, _) => created(service.create_clinic(body)),

        (E::Department, O::List, _) => ok(service.list_departments()),
        (E::Department, O::Get, Some(id)) => ok(service.get_department(id)),
        (E::Department, O::Create, _) => created(service.create_department(body)),
        (E::Department, O::Update, Some(id)) => ok(service.update_department(id, body)),
        (E::Department, O::Delete, Some(id)) => deleted(entity, service.delete_department(id)),

        (E::DoctorClinic, O::Create, _) => created(service.create_doctor_clinic(body)),

        _ => route_not_found(),
    }
}

/// Returns whether `(entity, operation)` is part of the exposed surface.
fn is_routable(entity: EntityKind, operation: Operation) -> bool {
    use EntityKind as E;
    match entity {
        E::Doctor | E::Patient | E::Department => true,
        E::Appointment | E::Prescription | E::Clinic => {
            matches!(operation, Operation::List | Operation::Create)
        }
        E::DoctorClinic => operation == Operation::Create,
    }
}

fn entity_for(segment: &str) -> Option<EntityKind> {
    EntityKind::ALL
        .into_iter()
        .find(|entity| collection(*entity) == segment)
}

pub(crate) fn route_not_found() -> ApiResponse {
    ApiResponse::error(STATUS_NOT_FOUND, "route not found")
}

pub(crate) fn ok<T: Serialize>(result: Result<T, RecordError>) -> ApiResponse {
    respond(STATUS_OK, result)
}

pub(crate) fn created<T: Serialize>(result: Result<T, RecordError>) -> ApiResponse {
    respond(STATUS_CREATED, result)
}

pub(crate) fn deleted(entity: EntityKind, result: Result<(), RecordError>) -> ApiResponse {
    let message = json!({ "message": format!("{entity} deleted") });
    respond(STATUS_OK, result.map(|()| message))
}

fn respond<T: Serialize>(status: u16, result: Result<T, RecordError>) -> ApiResponse {
    match result {
        Ok(payload) => ApiResponse::json(status, &payload),
        Err(err) => failure(err),
    }
}

fn failure(err: RecordError) -> ApiResponse {
    match (err.kind(), &err) {
        (ErrorKind::NotFound, RecordError::NotFound { entity, .. }) => {
            ApiResponse::not_found(*entity)
        }
        (ErrorKind::NotFound, _) => ApiResponse::error(STATUS_NOT_FOUND, err.to_string()),
        (ErrorKind::InvalidInput | ErrorKind::ConstraintViolation | ErrorKind::StoreError, _) => {
            ApiResponse::error(STATUS_BAD_REQUEST, err.to_string())
        }
    }
}
