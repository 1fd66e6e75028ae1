//! Error taxonomy shared by the gateway, the service and the transport.
//!
//! # Invariants
//! - Every failure maps to exactly one [`ErrorKind`].
//! - `InvalidInput` is only produced on write paths.
//! - SQLite constraint failures are `ConstraintViolation`; every other store
//!   failure is `StoreError`.

use crate::db::DbError;
use crate::model::records::RecordId;
use crate::model::schema::EntityKind;
use crate::validate::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RecordResult<T> = Result<T, RecordError>;

/// Classified error kind surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    ConstraintViolation,
    NotFound,
    StoreError,
}

impl ErrorKind {
    /// Stable code used in log events.
    pub fn code(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::ConstraintViolation => "constraint_violation",
            Self::NotFound => "not_found",
            Self::StoreError => "store_error",
        }
    }
}

/// Error returned by record gateway and service operations.
#[derive(Debug)]
pub enum RecordError {
    InvalidInput(ValidationError),
    /// Foreign-key, uniqueness or not-null failure reported by the store.
    ConstraintViolation(String),
    NotFound { entity: EntityKind, id: RecordId },
    Db(DbError),
    /// A value could not be bound to, or read back from, the store.
    InvalidData(String),
}

impl RecordError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::ConstraintViolation(_) => ErrorKind::ConstraintViolation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Db(_) | Self::InvalidData(_) => ErrorKind::StoreError,
        }
    }
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(err) => write!(f, "invalid input: {err}"),
            Self::ConstraintViolation(message) => write!(f, "constraint violation: {message}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid record data: {message}"),
        }
    }
}

impl Error for RecordError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::ConstraintViolation(_) | Self::NotFound { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RecordError {
    fn from(value: ValidationError) -> Self {
        Self::InvalidInput(value)
    }
}

impl From<DbError> for RecordError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RecordError {
    fn from(value: rusqlite::Error) -> Self {
        if value.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation) {
            return Self::ConstraintViolation(value.to_string());
        }
        Self::Db(DbError::Sqlite(value))
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, RecordError};
    use crate::model::schema::EntityKind;
    use rusqlite::Connection;

    #[test]
    fn constraint_failures_are_classified() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v TEXT NOT NULL);").unwrap();
        let err: RecordError = conn
            .execute("INSERT INTO t (v) VALUES (NULL);", [])
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
    }

    #[test]
    fn other_sqlite_failures_are_store_errors() {
        let conn = Connection::open_in_memory().unwrap();
        let err: RecordError = conn
            .execute("SELECT * FROM missing_table;", [])
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::StoreError);
    }

    #[test]
    fn not_found_message_names_entity() {
        let err = RecordError::NotFound {
            entity: EntityKind::Doctor,
            id: 42,
        };
        assert_eq!(err.to_string(), "Doctor not found: 42");
        assert_eq!(err.kind().code(), "not_found");
    }
}
