//! Record use-case service.
//!
//! # Responsibility
//! - Expose the per-entity operation set consumed by the transport layer.
//! - Compose write validation with the persistence gateway.
//! - Fix the relation-expansion shape of every query.
//!
//! # Invariants
//! - The service owns the single store connection; each call borrows a
//!   gateway for its own duration only.
//! - Errors are passed upward unchanged; nothing is retried.
//! - Appointment, Prescription and Clinic expose list + create only;
//!   DoctorClinic exposes create only.

use crate::config::ClinicConfig;
use crate::db::{open_db, open_db_in_memory};
use crate::error::{RecordError, RecordResult};
use crate::model::records::{Expanded, RecordId};
use crate::model::schema::{EntityKind, Expand, Relation};
use crate::repo::gateway::{RecordGateway, SqliteRecordGateway};
use crate::validate::validate_write;
use log::{debug, warn};
use rusqlite::Connection;
use serde_json::Value;
use std::time::Instant;

const DOCTOR_SUMMARY: &[Expand] = &[Expand::of(Relation::DoctorDepartment)];
const CLINIC_OF_ASSOCIATION: &[Expand] = &[Expand::of(Relation::DoctorClinicClinic)];
const DOCTOR_OF_ASSOCIATION: &[Expand] = &[Expand::of(Relation::DoctorClinicDoctor)];
const DOCTOR_DETAIL: &[Expand] = &[
    Expand::of(Relation::DoctorDepartment),
    Expand::of(Relation::DoctorDepartmentHead),
    Expand::of(Relation::DoctorAppointments),
    Expand::of(Relation::DoctorPrescriptions),
    Expand::with(Relation::DoctorClinics, CLINIC_OF_ASSOCIATION),
];
const PATIENT_DETAIL: &[Expand] = &[
    Expand::of(Relation::PatientAppointments),
    Expand::of(Relation::PatientPrescriptions),
];
const APPOINTMENT_PARTIES: &[Expand] = &[
    Expand::of(Relation::AppointmentDoctor),
    Expand::of(Relation::AppointmentPatient),
];
const PRESCRIPTION_PARTIES: &[Expand] = &[
    Expand::of(Relation::PrescriptionDoctor),
    Expand::of(Relation::PrescriptionPatient),
];
const CLINIC_LISTING: &[Expand] = &[Expand::with(
    Relation::ClinicDoctorClinics,
    DOCTOR_OF_ASSOCIATION,
)];
const DEPARTMENT_HEAD: &[Expand] = &[Expand::of(Relation::DepartmentHeadDoctor)];
const DEPARTMENT_DETAIL: &[Expand] = &[
    Expand::of(Relation::DepartmentHeadDoctor),
    Expand::of(Relation::DepartmentDoctors),
];
const ASSOCIATION_PARTIES: &[Expand] = &[
    Expand::of(Relation::DoctorClinicDoctor),
    Expand::of(Relation::DoctorClinicClinic),
];

/// Per-entity record operations over one owned store connection.
pub struct RecordService {
    conn: Connection,
}

impl RecordService {
    /// Opens the store described by `config` (file or in-memory).
    pub fn open(config: &ClinicConfig) -> RecordResult<Self> {
        let conn = match &config.db_path {
            Some(path) => open_db(path)?,
            None => open_db_in_memory()?,
        };
        Self::from_connection(conn)
    }

    /// Opens a fresh in-memory store.
    pub fn open_in_memory() -> RecordResult<Self> {
        Self::from_connection(open_db_in_memory()?)
    }

    /// Takes ownership of a connection after checking it is migrated.
    pub fn from_connection(conn: Connection) -> RecordResult<Self> {
        SqliteRecordGateway::try_new(&conn)?;
        Ok(Self { conn })
    }

    /// Releases the store connection, reporting any close failure.
    pub fn close(self) -> RecordResult<()> {
        self.conn.close().map_err(|(_, err)| RecordError::from(err))
    }

    /// Borrows the underlying connection for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn list_doctors(&self) -> RecordResult<Vec<Expanded>> {
        self.list(EntityKind::Doctor, DOCTOR_SUMMARY)
    }

    /// Doctor with department, headed department, appointments,
    /// prescriptions and clinic associations (each with its clinic).
    pub fn get_doctor(&self, id: RecordId) -> RecordResult<Expanded> {
        self.get(EntityKind::Doctor, id, DOCTOR_DETAIL)
    }

    pub fn create_doctor(&self, body: &Value) -> RecordResult<Expanded> {
        self.create(EntityKind::Doctor, body, DOCTOR_SUMMARY)
    }

    pub fn update_doctor(&self, id: RecordId, body: &Value) -> RecordResult<Expanded> {
        self.update(EntityKind::Doctor, id, body, DOCTOR_SUMMARY)
    }

    pub fn delete_doctor(&self, id: RecordId) -> RecordResult<()> {
        self.delete(EntityKind::Doctor, id)
    }

    pub fn list_patients(&self) -> RecordResult<Vec<Expanded>> {
        self.list(EntityKind::Patient, &[])
    }

    pub fn get_patient(&self, id: RecordId) -> RecordResult<Expanded> {
        self.get(EntityKind::Patient, id, PATIENT_DETAIL)
    }

    pub fn create_patient(&self, body: &Value) -> RecordResult<Expanded> {
        self.create(EntityKind::Patient, body, &[])
    }

    pub fn update_patient(&self, id: RecordId, body: &Value) -> RecordResult<Expanded> {
        self.update(EntityKind::Patient, id, body, &[])
    }

    pub fn delete_patient(&self, id: RecordId) -> RecordResult<()> {
        self.delete(EntityKind::Patient, id)
    }

    pub fn list_appointments(&self) -> RecordResult<Vec<Expanded>> {
        self.list(EntityKind::Appointment, APPOINTMENT_PARTIES)
    }

    pub fn create_appointment(&self, body: &Value) -> RecordResult<Expanded> {
        self.create(EntityKind::Appointment, body, APPOINTMENT_PARTIES)
    }

    pub fn list_prescriptions(&self) -> RecordResult<Vec<Expanded>> {
        self.list(EntityKind::Prescription, PRESCRIPTION_PARTIES)
    }

    pub fn create_prescription(&self, body: &Value) -> RecordResult<Expanded> {
        self.create(EntityKind::Prescription, body, PRESCRIPTION_PARTIES)
    }

    /// Clinics with their doctor associations, each with its doctor.
    pub fn list_clinics(&self) -> RecordResult<Vec<Expanded>> {
        self.list(EntityKind::Clinic, CLINIC_LISTING)
    }

    pub fn create_clinic(&self, body: &Value) -> RecordResult<Expanded> {
        self.create(EntityKind::Clinic, body, &[])
    }

    pub fn list_departments(&self) -> RecordResult<Vec<Expanded>> {
        self.list(EntityKind::Department, DEPARTMENT_DETAIL)
    }

    pub fn get_department(&self, id: RecordId) -> RecordResult<Expanded> {
        self.get(EntityKind::Department, id, DEPARTMENT_DETAIL)
    }

    pub fn create_department(&self, body: &Value) -> RecordResult<Expanded> {
        self.create(EntityKind::Department, body, DEPARTMENT_HEAD)
    }

    pub fn update_department(&self, id: RecordId, body: &Value) -> RecordResult<Expanded> {
        self.update(EntityKind::Department, id, body, DEPARTMENT_DETAIL)
    }

    pub fn delete_department(&self, id: RecordId) -> RecordResult<()> {
        self.delete(EntityKind::Department, id)
    }

    /// Links a doctor to a clinic with consultation days and hours.
    pub fn create_doctor_clinic(&self, body: &Value) -> RecordResult<Expanded> {
        self.create(EntityKind::DoctorClinic, body, ASSOCIATION_PARTIES)
    }

    fn list(&self, entity: EntityKind, expand: &[Expand]) -> RecordResult<Vec<Expanded>> {
        self.run("list", entity, |gateway| gateway.list_all(entity, expand))
    }

    fn get(&self, entity: EntityKind, id: RecordId, expand: &[Expand]) -> RecordResult<Expanded> {
        self.run("get", entity, |gateway| {
            gateway.get_by_id(entity, id, expand)
        })
    }

    fn create(&self, entity: EntityKind, body: &Value, expand: &[Expand]) -> RecordResult<Expanded> {
        self.run("create", entity, |gateway| {
            let input = validate_write(entity, body)?;
            gateway.create(&input, expand)
        })
    }

    fn update(
        &self,
        entity: EntityKind,
        id: RecordId,
        body: &Value,
        expand: &[Expand],
    ) -> RecordResult<Expanded> {
        self.run("update", entity, |gateway| {
            let input = validate_write(entity, body)?;
            gateway.update(id, &input, expand)
        })
    }

    fn delete(&self, entity: EntityKind, id: RecordId) -> RecordResult<()> {
        self.run("delete", entity, |gateway| gateway.delete(entity, id))
    }

    fn run<T>(
        &self,
        operation: &'static str,
        entity: EntityKind,
        call: impl FnOnce(&SqliteRecordGateway<'_>) -> RecordResult<T>,
    ) -> RecordResult<T> {
        let started_at = Instant::now();
        let gateway = SqliteRecordGateway::new(&self.conn);
        match call(&gateway) {
            Ok(value) => {
                debug!(
                    "event=record_op module=service status=ok op={operation} entity={entity} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err) => {
                warn!(
                    "event=record_op module=service status=error op={operation} entity={entity} duration_ms={} error_code={}",
                    started_at.elapsed().as_millis(),
                    err.kind().code()
                );
                Err(err)
            }
        }
    }
}
