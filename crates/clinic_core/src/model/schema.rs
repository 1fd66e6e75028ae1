//! Entity schema for the clinic record model.
//!
//! # Responsibility
//! - Describe every entity's fields, storage columns, types and optionality.
//! - Describe the relation graph used for relation expansion on reads.
//!
//! # Invariants
//! - Field order in [`EntityKind::fields`] is the canonical column order for
//!   inserts, updates and selects.
//! - Every `Join::Outgoing` column is a foreign-key field of the owner entity.
//! - Every `Join::Incoming` column is a foreign-key field of the target entity.
//!
//! # See also
//! - crates/clinic_core/src/db/migrations/0001_init.sql

use std::fmt::{Display, Formatter};

/// The seven record types managed by the clinic store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Doctor,
    Patient,
    Appointment,
    Prescription,
    Clinic,
    Department,
    /// Association row linking one doctor to one clinic.
    DoctorClinic,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Doctor,
        EntityKind::Patient,
        EntityKind::Appointment,
        EntityKind::Prescription,
        EntityKind::Clinic,
        EntityKind::Department,
        EntityKind::DoctorClinic,
    ];

    /// Human-readable entity label used in messages and generated docs.
    pub fn label(self) -> &'static str {
        match self {
            Self::Doctor => "Doctor",
            Self::Patient => "Patient",
            Self::Appointment => "Appointment",
            Self::Prescription => "Prescription",
            Self::Clinic => "Clinic",
            Self::Department => "Department",
            Self::DoctorClinic => "DoctorClinic",
        }
    }

    /// Backing SQLite table name.
    pub fn table(self) -> &'static str {
        match self {
            Self::Doctor => "doctors",
            Self::Patient => "patients",
            Self::Appointment => "appointments",
            Self::Prescription => "prescriptions",
            Self::Clinic => "clinics",
            Self::Department => "departments",
            Self::DoctorClinic => "doctor_clinics",
        }
    }

    /// Writable fields in canonical column order. The `id` column is not
    /// listed: identifiers are assigned by the store.
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            Self::Doctor => DOCTOR_FIELDS,
            Self::Patient => PATIENT_FIELDS,
            Self::Appointment => APPOINTMENT_FIELDS,
            Self::Prescription => PRESCRIPTION_FIELDS,
            Self::Clinic => CLINIC_FIELDS,
            Self::Department => DEPARTMENT_FIELDS,
            Self::DoctorClinic => DOCTOR_CLINIC_FIELDS,
        }
    }

    /// Looks up a field by its JSON name or accepted alias.
    pub fn field(self, name: &str) -> Option<&'static FieldSpec> {
        self.fields()
            .iter()
            .find(|field| field.name == name || field.alias == Some(name))
    }

    /// Fields that must be present and non-empty on every write.
    pub fn required_fields(self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields().iter().filter(|field| field.required)
    }

    /// Relations owned by this entity, in declaration order.
    pub fn relations(self) -> &'static [Relation] {
        match self {
            Self::Doctor => &[
                Relation::DoctorDepartment,
                Relation::DoctorDepartmentHead,
                Relation::DoctorAppointments,
                Relation::DoctorPrescriptions,
                Relation::DoctorClinics,
            ],
            Self::Patient => &[
                Relation::PatientAppointments,
                Relation::PatientPrescriptions,
            ],
            Self::Appointment => &[Relation::AppointmentDoctor, Relation::AppointmentPatient],
            Self::Prescription => &[
                Relation::PrescriptionDoctor,
                Relation::PrescriptionPatient,
            ],
            Self::Clinic => &[Relation::ClinicDoctorClinics],
            Self::Department => &[Relation::DepartmentHeadDoctor, Relation::DepartmentDoctors],
            Self::DoctorClinic => &[Relation::DoctorClinicDoctor, Relation::DoctorClinicClinic],
        }
    }

    /// Comma-separated select list: `id` followed by every field column.
    pub fn select_columns(self) -> String {
        std::iter::once("id")
            .chain(self.fields().iter().map(|field| field.column))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Storage/transport type of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Free text. Email and phone values are not format-checked.
    Text,
    /// Integer identifier of a row of the target entity.
    ForeignKey(EntityKind),
    /// ISO-8601 date-time, stored as RFC 3339 UTC text.
    DateTime,
}

impl FieldType {
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Text => "string",
            Self::ForeignKey(_) => "integer",
            Self::DateTime => "date-time string",
        }
    }
}

/// One writable field of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// camelCase JSON name.
    pub name: &'static str,
    /// snake_case column name.
    pub column: &'static str,
    pub ty: FieldType,
    pub required: bool,
    /// Legacy input name accepted in place of `name`.
    pub alias: Option<&'static str>,
}

const fn required(name: &'static str, column: &'static str, ty: FieldType) -> FieldSpec {
    FieldSpec {
        name,
        column,
        ty,
        required: true,
        alias: None,
    }
}

const fn optional(name: &'static str, column: &'static str, ty: FieldType) -> FieldSpec {
    FieldSpec {
        name,
        column,
        ty,
        required: false,
        alias: None,
    }
}

const DOCTOR_FIELDS: &[FieldSpec] = &[
    required("name", "name", FieldType::Text),
    required("email", "email", FieldType::Text),
    required("phone", "phone", FieldType::Text),
    required("specialization", "specialization", FieldType::Text),
    optional(
        "departmentId",
        "department_id",
        FieldType::ForeignKey(EntityKind::Department),
    ),
];

const PATIENT_FIELDS: &[FieldSpec] = &[
    required("name", "name", FieldType::Text),
    FieldSpec {
        name: "dateOfBirth",
        column: "date_of_birth",
        ty: FieldType::DateTime,
        required: true,
        alias: Some("dob"),
    },
    required("phone", "phone", FieldType::Text),
    optional("email", "email", FieldType::Text),
    required("address", "address", FieldType::Text),
    required("emergencyContact", "emergency_contact", FieldType::Text),
    required("emergencyPhone", "emergency_phone", FieldType::Text),
];

const APPOINTMENT_FIELDS: &[FieldSpec] = &[
    required(
        "doctorId",
        "doctor_id",
        FieldType::ForeignKey(EntityKind::Doctor),
    ),
    required(
        "patientId",
        "patient_id",
        FieldType::ForeignKey(EntityKind::Patient),
    ),
    required("appointmentDate", "appointment_date", FieldType::DateTime),
    optional("diagnosis", "diagnosis", FieldType::Text),
    optional("treatmentPlan", "treatment_plan", FieldType::Text),
];

const PRESCRIPTION_FIELDS: &[FieldSpec] = &[
    required(
        "patientId",
        "patient_id",
        FieldType::ForeignKey(EntityKind::Patient),
    ),
    required(
        "doctorId",
        "doctor_id",
        FieldType::ForeignKey(EntityKind::Doctor),
    ),
    required("medicationName", "medication_name", FieldType::Text),
    required("dosage", "dosage", FieldType::Text),
    required("frequency", "frequency", FieldType::Text),
    required("prescriptionDate", "prescription_date", FieldType::DateTime),
    optional(
        "prescriptionEndDate",
        "prescription_end_date",
        FieldType::DateTime,
    ),
];

const CLINIC_FIELDS: &[FieldSpec] = &[
    required("name", "name", FieldType::Text),
    required("address", "address", FieldType::Text),
    required("phone", "phone", FieldType::Text),
];

const DEPARTMENT_FIELDS: &[FieldSpec] = &[
    required("name", "name", FieldType::Text),
    required("location", "location", FieldType::Text),
    optional(
        "headDoctorId",
        "head_doctor_id",
        FieldType::ForeignKey(EntityKind::Doctor),
    ),
];

const DOCTOR_CLINIC_FIELDS: &[FieldSpec] = &[
    required(
        "doctorId",
        "doctor_id",
        FieldType::ForeignKey(EntityKind::Doctor),
    ),
    required(
        "clinicId",
        "clinic_id",
        FieldType::ForeignKey(EntityKind::Clinic),
    ),
    required("consultationDays", "consultation_days", FieldType::Text),
    required("consultationHours", "consultation_hours", FieldType::Text),
];

/// Whether a relation resolves to at most one row or to a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

/// How a relation is joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Join {
    /// The owner row holds the foreign key in this column.
    Outgoing(&'static str),
    /// Target rows hold a foreign key to the owner in this column.
    Incoming(&'static str),
}

/// Every named relation in the record model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    DoctorDepartment,
    /// The department this doctor heads, if any.
    DoctorDepartmentHead,
    DoctorAppointments,
    DoctorPrescriptions,
    DoctorClinics,
    PatientAppointments,
    PatientPrescriptions,
    AppointmentDoctor,
    AppointmentPatient,
    PrescriptionDoctor,
    PrescriptionPatient,
    ClinicDoctorClinics,
    DepartmentHeadDoctor,
    DepartmentDoctors,
    DoctorClinicDoctor,
    DoctorClinicClinic,
}

/// Static description of one relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationSpec {
    pub owner: EntityKind,
    /// JSON key under which the expansion is rendered.
    pub key: &'static str,
    pub target: EntityKind,
    pub cardinality: Cardinality,
    pub join: Join,
}

impl Relation {
    pub fn spec(self) -> RelationSpec {
        use Cardinality::{Many, One};
        use EntityKind as E;

        let (owner, key, target, cardinality, join) = match self {
            Self::DoctorDepartment => (
                E::Doctor,
                "department",
                E::Department,
                One,
                Join::Outgoing("department_id"),
            ),
            Self::DoctorDepartmentHead => (
                E::Doctor,
                "departmentHead",
                E::Department,
                One,
                Join::Incoming("head_doctor_id"),
            ),
            Self::DoctorAppointments => (
                E::Doctor,
                "appointments",
                E::Appointment,
                Many,
                Join::Incoming("doctor_id"),
            ),
            Self::DoctorPrescriptions => (
                E::Doctor,
                "prescriptions",
                E::Prescription,
                Many,
                Join::Incoming("doctor_id"),
            ),
            Self::DoctorClinics => (
                E::Doctor,
                "doctorClinics",
                E::DoctorClinic,
                Many,
                Join::Incoming("doctor_id"),
            ),
            Self::PatientAppointments => (
                E::Patient,
                "appointments",
                E::Appointment,
                Many,
                Join::Incoming("patient_id"),
            ),
            Self::PatientPrescriptions => (
                E::Patient,
                "prescriptions",
                E::Prescription,
                Many,
                Join::Incoming("patient_id"),
            ),
            Self::AppointmentDoctor => (
                E::Appointment,
                "doctor",
                E::Doctor,
                One,
                Join::Outgoing("doctor_id"),
            ),
            Self::AppointmentPatient => (
                E::Appointment,
                "patient",
                E::Patient,
                One,
                Join::Outgoing("patient_id"),
            ),
            Self::PrescriptionDoctor => (
                E::Prescription,
                "doctor",
                E::Doctor,
                One,
                Join::Outgoing("doctor_id"),
            ),
            Self::PrescriptionPatient => (
                E::Prescription,
                "patient",
                E::Patient,
                One,
                Join::Outgoing("patient_id"),
            ),
            Self::ClinicDoctorClinics => (
                E::Clinic,
                "doctorClinics",
                E::DoctorClinic,
                Many,
                Join::Incoming("clinic_id"),
            ),
            Self::DepartmentHeadDoctor => (
                E::Department,
                "headDoctor",
                E::Doctor,
                One,
                Join::Outgoing("head_doctor_id"),
            ),
            Self::DepartmentDoctors => (
                E::Department,
                "doctors",
                E::Doctor,
                Many,
                Join::Incoming("department_id"),
            ),
            Self::DoctorClinicDoctor => (
                E::DoctorClinic,
                "doctor",
                E::Doctor,
                One,
                Join::Outgoing("doctor_id"),
            ),
            Self::DoctorClinicClinic => (
                E::DoctorClinic,
                "clinic",
                E::Clinic,
                One,
                Join::Outgoing("clinic_id"),
            ),
        };

        RelationSpec {
            owner,
            key,
            target,
            cardinality,
            join,
        }
    }

    pub fn owner(self) -> EntityKind {
        self.spec().owner
    }

    pub fn key(self) -> &'static str {
        self.spec().key
    }

    pub fn target(self) -> EntityKind {
        self.spec().target
    }

    pub fn cardinality(self) -> Cardinality {
        self.spec().cardinality
    }
}

/// One node of a relation-expansion tree.
///
/// `nested` expansions are applied to every record the relation resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expand {
    pub relation: Relation,
    pub nested: &'static [Expand],
}

impl Expand {
    pub const fn of(relation: Relation) -> Self {
        Self {
            relation,
            nested: &[],
        }
    }

    pub const fn with(relation: Relation, nested: &'static [Expand]) -> Self {
        Self { relation, nested }
    }
}
