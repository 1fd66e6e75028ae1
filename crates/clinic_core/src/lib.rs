//! Core record service for the healthcare clinic domain.
//! This crate is the single source of truth for record invariants.

pub mod api;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod server;
pub mod service;
pub mod validate;

pub use api::{handle, ApiRequest, ApiResponse, Method};
pub use config::ClinicConfig;
pub use error::{ErrorKind, RecordError, RecordResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::input::{EntityInput, FieldValue};
pub use model::records::{
    Appointment, Clinic, Department, Doctor, DoctorClinic, Expanded, Patient, Prescription,
    Record, RecordId, Related,
};
pub use model::schema::{EntityKind, Expand, Relation};
pub use repo::gateway::{RecordGateway, SqliteRecordGateway};
pub use service::record_service::RecordService;
pub use validate::{validate_write, ValidationError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
