//! Clinic record model.
//!
//! # Responsibility
//! - Define the entity schema shared by validation and persistence.
//! - Define typed read shapes and validated write payloads.
//!
//! # Invariants
//! - Every record is identified by a store-assigned integer id.
//! - Deletion is physical; there are no tombstones.
//!
//! # See also
//! - crates/clinic_core/src/db/migrations/0001_init.sql

pub mod input;
pub mod records;
pub mod schema;
pub mod timestamp;
