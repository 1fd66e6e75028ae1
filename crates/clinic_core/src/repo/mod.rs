//! Persistence gateway over the relational store.
//!
//! # Responsibility
//! - Define the data access contract used by the record service.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Gateway APIs return semantic errors (`NotFound`, `ConstraintViolation`)
//!   in addition to store transport errors.
//! - Relation expansion follows the schema relation graph only.

pub mod gateway;
