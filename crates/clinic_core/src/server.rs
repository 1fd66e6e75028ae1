//! HTTP front end for the record service.
//!
//! # Responsibility
//! - Register one axum route per exposed (entity, operation) pair.
//! - Serve the OpenAPI document at `/api-docs`.
//!
//! # Invariants
//! - Status codes and JSON envelopes are the ones produced by [`crate::api`].
//! - Unexposed paths and methods answer `404 route not found`.
//! - Requests are serialized on the single store connection.

use crate::api::{self, ApiResponse, STATUS_BAD_REQUEST};
use crate::docs::openapi_document;
use crate::model::records::RecordId;
use crate::model::schema::EntityKind;
use crate::service::record_service::RecordService;
use crate::validate::text_to_id;
use axum::body::Bytes;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use log::info;
use parking_lot::Mutex;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Record service shared by every request handler.
pub type SharedService = Arc<Mutex<RecordService>>;

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body)).into_response()
    }
}

/// Builds the REST router over `service`.
pub fn router(service: RecordService) -> Router {
    let shared: SharedService = Arc::new(Mutex::new(service));

    Router::new()
        .route(
            "/doctors",
            get(list_doctors)
                .post(create_doctor)
                .fallback(route_not_found),
        )
        .route(
            "/doctors/:id",
            get(get_doctor)
                .put(update_doctor)
                .delete(delete_doctor)
                .fallback(route_not_found),
        )
        .route(
            "/patients",
            get(list_patients)
                .post(create_patient)
                .fallback(route_not_found),
        )
        .route(
            "/patients/:id",
            get(get_patient)
                .put(update_patient)
                .delete(delete_patient)
                .fallback(route_not_found),
        )
        .route(
            "/appointments",
            get(list_appointments)
                .post(create_appointment)
                .fallback(route_not_found),
        )
        .route(
            "/prescriptions",
            get(list_prescriptions)
                .post(create_prescription)
                .fallback(route_not_found),
        )
        .route(
            "/clinics",
            get(list_clinics)
                .post(create_clinic)
                .fallback(route_not_found),
        )
        .route(
            "/departments",
            get(list_departments)
                .post(create_department)
                .fallback(route_not_found),
        )
        .route(
            "/departments/:id",
            get(get_department)
                .put(update_department)
                .delete(delete_department)
                .fallback(route_not_found),
        )
        .route(
            "/doctor-clinics",
            post(create_doctor_clinic).fallback(route_not_found),
        )
        .route("/api-docs", get(api_docs).fallback(route_not_found))
        .fallback(route_not_found)
        .layer(Extension(shared))
}

/// Binds `addr` and serves [`router`] until the listener fails.
pub async fn serve(addr: SocketAddr, service: RecordService) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(
        "event=http_listen module=server status=ok addr={}",
        listener.local_addr()?
    );
    axum::serve(listener, router(service)).await
}

async fn route_not_found() -> ApiResponse {
    api::route_not_found()
}

async fn api_docs() -> Json<Value> {
    Json(openapi_document())
}

async fn list_doctors(Extension(service): Extension<SharedService>) -> ApiResponse {
    api::ok(service.lock().list_doctors())
}

async fn get_doctor(
    Extension(service): Extension<SharedService>,
    Path(raw_id): Path<String>,
) -> ApiResponse {
    with_id(EntityKind::Doctor, &raw_id, |id| {
        api::ok(service.lock().get_doctor(id))
    })
}

async fn create_doctor(Extension(service): Extension<SharedService>, body: Bytes) -> ApiResponse {
    with_body(&body, |body| api::created(service.lock().create_doctor(body)))
}

async fn update_doctor(
    Extension(service): Extension<SharedService>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> ApiResponse {
    with_id(EntityKind::Doctor, &raw_id, |id| {
        with_body(&body, |body| api::ok(service.lock().update_doctor(id, body)))
    })
}

async fn delete_doctor(
    Extension(service): Extension<SharedService>,
    Path(raw_id): Path<String>,
) -> ApiResponse {
    with_id(EntityKind::Doctor, &raw_id, |id| {
        api::deleted(EntityKind::Doctor, service.lock().delete_doctor(id))
    })
}

async fn list_patients(Extension(service): Extension<SharedService>) -> ApiResponse {
    api::ok(service.lock().list_patients())
}

async fn get_patient(
    Extension(service): Extension<SharedService>,
    Path(raw_id): Path<String>,
) -> ApiResponse {
    with_id(EntityKind::Patient, &raw_id, |id| {
        api::ok(service.lock().get_patient(id))
    })
}

async fn create_patient(Extension(service): Extension<SharedService>, body: Bytes) -> ApiResponse {
    with_body(&body, |body| api::created(service.lock().create_patient(body)))
}

async fn update_patient(
    Extension(service): Extension<SharedService>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> ApiResponse {
    with_id(EntityKind::Patient, &raw_id, |id| {
        with_body(&body, |body| api::ok(service.lock().update_patient(id, body)))
    })
}

async fn delete_patient(
    Extension(service): Extension<SharedService>,
    Path(raw_id): Path<String>,
) -> ApiResponse {
    with_id(EntityKind::Patient, &raw_id, |id| {
        api::deleted(EntityKind::Patient, service.lock().delete_patient(id))
    })
}

async fn list_appointments(Extension(service): Extension<SharedService>) -> ApiResponse {
    api::ok(service.lock().list_appointments())
}

async fn create_appointment(
    Extension(service): Extension<SharedService>,
    body: Bytes,
) -> ApiResponse {
    with_body(&body, |body| {
        api::created(service.lock().create_appointment(body))
    })
}

async fn list_prescriptions(Extension(service): Extension<SharedService>) -> ApiResponse {
    api::ok(service.lock().list_prescriptions())
}

async fn create_prescription(
    Extension(service): Extension<SharedService>,
    body: Bytes,
) -> ApiResponse {
    with_body(&body, |body| {
        api::created(service.lock().create_prescription(body))
    })
}

async fn list_clinics(Extension(service): Extension<SharedService>) -> ApiResponse {
    api::ok(service.lock().list_clinics())
}

async fn create_clinic(Extension(service): Extension<SharedService>, body: Bytes) -> ApiResponse {
    with_body(&body, |body| api::created(service.lock().create_clinic(body)))
}

async fn list_departments(Extension(service): Extension<SharedService>) -> ApiResponse {
    api::ok(service.lock().list_departments())
}

async fn get_department(
    Extension(service): Extension<SharedService>,
    Path(raw_id): Path<String>,
) -> ApiResponse {
    with_id(EntityKind::Department, &raw_id, |id| {
        api::ok(service.lock().get_department(id))
    })
}

async fn create_department(
    Extension(service): Extension<SharedService>,
    body: Bytes,
) -> ApiResponse {
    with_body(&body, |body| {
        api::created(service.lock().create_department(body))
    })
}

async fn update_department(
    Extension(service): Extension<SharedService>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> ApiResponse {
    with_id(EntityKind::Department, &raw_id, |id| {
        with_body(&body, |body| {
            api::ok(service.lock().update_department(id, body))
        })
    })
}

async fn delete_department(
    Extension(service): Extension<SharedService>,
    Path(raw_id): Path<String>,
) -> ApiResponse {
    with_id(EntityKind::Department, &raw_id, |id| {
        api::deleted(EntityKind::Department, service.lock().delete_department(id))
    })
}

async fn create_doctor_clinic(
    Extension(service): Extension<SharedService>,
    body: Bytes,
) -> ApiResponse {
    with_body(&body, |body| {
        api::created(service.lock().create_doctor_clinic(body))
    })
}

fn with_id(
    entity: EntityKind,
    raw_id: &str,
    call: impl FnOnce(RecordId) -> ApiResponse,
) -> ApiResponse {
    match text_to_id(raw_id) {
        Some(id) => call(id),
        None => ApiResponse::not_found(entity),
    }
}

/// Parses the raw request body; an empty body is JSON `null`.
fn with_body(raw: &[u8], call: impl FnOnce(&Value) -> ApiResponse) -> ApiResponse {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return call(&Value::Null);
    }
    match serde_json::from_slice::<Value>(raw) {
        Ok(body) => call(&body),
        Err(err) => ApiResponse::error(STATUS_BAD_REQUEST, format!("invalid JSON body: {err}")),
    }
}
