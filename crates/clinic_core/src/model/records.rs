//! Typed record shapes returned by reads.
//!
//! # Responsibility
//! - Define one struct per stored entity, serialized with camelCase keys.
//! - Define the relation-expanded shape (`Expanded`) produced by the gateway.
//!
//! # Invariants
//! - `id` is assigned by the store and never changes.
//! - Date-time fields are UTC and serialize as ISO-8601 strings.
//! - An `Expanded` record carries only the relations that were requested.

use crate::model::schema::{EntityKind, Relation};
use crate::model::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Store-assigned integer identifier shared by every entity.
pub type RecordId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub specialization: String,
    pub department_id: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: RecordId,
    pub name: String,
    #[serde(serialize_with = "timestamp::serialize")]
    pub date_of_birth: DateTime<Utc>,
    pub phone: String,
    pub email: Option<String>,
    pub address: String,
    pub emergency_contact: String,
    pub emergency_phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: RecordId,
    pub doctor_id: RecordId,
    pub patient_id: RecordId,
    #[serde(serialize_with = "timestamp::serialize")]
    pub appointment_date: DateTime<Utc>,
    /// Filled in after the visit.
    pub diagnosis: Option<String>,
    /// Filled in after the visit.
    pub treatment_plan: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub doctor_id: RecordId,
    pub medication_name: String,
    pub dosage: String,
    pub frequency: String,
    #[serde(serialize_with = "timestamp::serialize")]
    pub prescription_date: DateTime<Utc>,
    /// `None` means the prescription is ongoing.
    #[serde(serialize_with = "timestamp::serialize_optional")]
    pub prescription_end_date: Option<DateTime<Utc>>,
}

impl Prescription {
    /// Returns whether the prescription has no end date.
    pub fn is_ongoing(&self) -> bool {
        self.prescription_end_date.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clinic {
    pub id: RecordId,
    pub name: String,
    pub address: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: RecordId,
    pub name: String,
    pub location: String,
    pub head_doctor_id: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorClinic {
    pub id: RecordId,
    pub doctor_id: RecordId,
    pub clinic_id: RecordId,
    pub consultation_days: String,
    pub consultation_hours: String,
}

/// Any stored row, tagged by entity on the Rust side only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Doctor(Doctor),
    Patient(Patient),
    Appointment(Appointment),
    Prescription(Prescription),
    Clinic(Clinic),
    Department(Department),
    DoctorClinic(DoctorClinic),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Doctor(_) => EntityKind::Doctor,
            Self::Patient(_) => EntityKind::Patient,
            Self::Appointment(_) => EntityKind::Appointment,
            Self::Prescription(_) => EntityKind::Prescription,
            Self::Clinic(_) => EntityKind::Clinic,
            Self::Department(_) => EntityKind::Department,
            Self::DoctorClinic(_) => EntityKind::DoctorClinic,
        }
    }

    pub fn id(&self) -> RecordId {
        match self {
            Self::Doctor(row) => row.id,
            Self::Patient(row) => row.id,
            Self::Appointment(row) => row.id,
            Self::Prescription(row) => row.id,
            Self::Clinic(row) => row.id,
            Self::Department(row) => row.id,
            Self::DoctorClinic(row) => row.id,
        }
    }

    /// Reads a foreign-key value by storage column name.
    ///
    /// Returns `None` for unset optional keys and for columns that are not
    /// foreign keys of this record.
    pub fn foreign_key(&self, column: &str) -> Option<RecordId> {
        match (self, column) {
            (Self::Doctor(row), "department_id") => row.department_id,
            (Self::Appointment(row), "doctor_id") => Some(row.doctor_id),
            (Self::Appointment(row), "patient_id") => Some(row.patient_id),
            (Self::Prescription(row), "doctor_id") => Some(row.doctor_id),
            (Self::Prescription(row), "patient_id") => Some(row.patient_id),
            (Self::Department(row), "head_doctor_id") => row.head_doctor_id,
            (Self::DoctorClinic(row), "doctor_id") => Some(row.doctor_id),
            (Self::DoctorClinic(row), "clinic_id") => Some(row.clinic_id),
            _ => None,
        }
    }

    pub fn as_doctor(&self) -> Option<&Doctor> {
        match self {
            Self::Doctor(row) => Some(row),
            _ => None,
        }
    }

    pub fn as_patient(&self) -> Option<&Patient> {
        match self {
            Self::Patient(row) => Some(row),
            _ => None,
        }
    }

    pub fn as_appointment(&self) -> Option<&Appointment> {
        match self {
            Self::Appointment(row) => Some(row),
            _ => None,
        }
    }

    pub fn as_prescription(&self) -> Option<&Prescription> {
        match self {
            Self::Prescription(row) => Some(row),
            _ => None,
        }
    }

    pub fn as_clinic(&self) -> Option<&Clinic> {
        match self {
            Self::Clinic(row) => Some(row),
            _ => None,
        }
    }

    pub fn as_department(&self) -> Option<&Department> {
        match self {
            Self::Department(row) => Some(row),
            _ => None,
        }
    }

    pub fn as_doctor_clinic(&self) -> Option<&DoctorClinic> {
        match self {
            Self::DoctorClinic(row) => Some(row),
            _ => None,
        }
    }
}

/// Resolved value of one expanded relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Related {
    /// To-one relation; serialized as an object or `null`.
    One(Option<Box<Expanded>>),
    /// To-many relation; serialized as an array.
    Many(Vec<Expanded>),
}

/// A record joined with the relations requested for a particular query.
///
/// Serializes as the record's own fields plus one key per relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Expanded {
    #[serde(flatten)]
    pub record: Record,
    #[serde(flatten)]
    relations: BTreeMap<&'static str, Related>,
}

impl Expanded {
    /// Wraps a record with no expanded relations.
    pub fn new(record: Record) -> Self {
        Self {
            record,
            relations: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, relation: Relation, related: Related) {
        self.relations.insert(relation.key(), related);
    }

    pub fn id(&self) -> RecordId {
        self.record.id()
    }

    pub fn kind(&self) -> EntityKind {
        self.record.kind()
    }

    /// Returns the resolved relation, or `None` when it was not requested.
    pub fn related(&self, relation: Relation) -> Option<&Related> {
        if relation.owner() != self.kind() {
            return None;
        }
        self.relations.get(relation.key())
    }

    /// Returns whether the relation was part of the expansion.
    pub fn has_relation(&self, relation: Relation) -> bool {
        self.related(relation).is_some()
    }

    /// Returns the target of an expanded to-one relation.
    pub fn one(&self, relation: Relation) -> Option<&Expanded> {
        match self.related(relation) {
            Some(Related::One(Some(target))) => Some(target),
            _ => None,
        }
    }

    /// Returns the rows of an expanded to-many relation (empty when absent).
    pub fn many(&self, relation: Relation) -> &[Expanded] {
        match self.related(relation) {
            Some(Related::Many(rows)) => rows.as_slice(),
            _ => &[],
        }
    }

    /// Number of relations carried by this record.
    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }
}
