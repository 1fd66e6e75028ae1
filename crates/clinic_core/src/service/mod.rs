//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate validation and gateway calls into per-entity operations.
//! - Keep the transport layer decoupled from storage details.

pub mod record_service;
