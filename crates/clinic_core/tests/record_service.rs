use chrono::{TimeZone, Utc};
use clinic_core::{
    ErrorKind, Expanded, RecordError, RecordId, RecordService, Related, Relation,
    ValidationError,
};
use serde_json::{json, Value};

fn service() -> RecordService {
    RecordService::open_in_memory().expect("open in-memory store")
}

fn doctor_body(name: &str, department_id: Option<RecordId>) -> Value {
    let mut body = json!({
        "name": name,
        "email": format!("{}@clinic.test", name.to_lowercase().replace(' ', ".")),
        "phone": "555-0100",
        "specialization": "Cardiology",
    });
    if let Some(id) = department_id {
        body["departmentId"] = json!(id);
    }
    body
}

fn patient_body(name: &str) -> Value {
    json!({
        "name": name,
        "dateOfBirth": "1990-04-12",
        "phone": "555-0200",
        "address": "12 Elm Street",
        "emergencyContact": "Sam Doe",
        "emergencyPhone": "555-0299",
    })
}

fn create_doctor(service: &RecordService, name: &str) -> RecordId {
    service
        .create_doctor(&doctor_body(name, None))
        .expect("create doctor")
        .id()
}

fn create_patient(service: &RecordService, name: &str) -> RecordId {
    service
        .create_patient(&patient_body(name))
        .expect("create patient")
        .id()
}

fn ids(rows: &[Expanded]) -> Vec<RecordId> {
    rows.iter().map(Expanded::id).collect()
}

#[test]
fn doctor_create_get_update_roundtrip() {
    let service = service();

    let created = service.create_doctor(&doctor_body("Ada Lane", None)).unwrap();
    assert!(created.id() > 0);
    assert!(created.has_relation(Relation::DoctorDepartment));
    assert!(created.one(Relation::DoctorDepartment).is_none());

    let loaded = service.get_doctor(created.id()).unwrap();
    let doctor = loaded.record.as_doctor().unwrap();
    assert_eq!(doctor.name, "Ada Lane");
    assert_eq!(doctor.email, "ada.lane@clinic.test");
    assert_eq!(doctor.department_id, None);

    let mut body = doctor_body("Ada Lane", None);
    body["specialization"] = json!("Neurology");
    let updated = service.update_doctor(created.id(), &body).unwrap();
    assert_eq!(updated.id(), created.id());
    assert_eq!(
        updated.record.as_doctor().unwrap().specialization,
        "Neurology"
    );
}

#[test]
fn identifiers_are_assigned_in_increasing_order() {
    let service = service();
    let first = create_doctor(&service, "First");
    let second = create_doctor(&service, "Second");
    assert!(second > first);

    let listed = service.list_doctors().unwrap();
    assert_eq!(ids(&listed), vec![first, second]);
}

#[test]
fn update_replaces_the_whole_record() {
    let service = service();
    let mut body = patient_body("Jo Doe");
    body["email"] = json!("jo@example.test");
    let created = service.create_patient(&body).unwrap();
    assert_eq!(
        created.record.as_patient().unwrap().email.as_deref(),
        Some("jo@example.test")
    );

    let updated = service
        .update_patient(created.id(), &patient_body("Jo Doe"))
        .unwrap();
    assert_eq!(updated.record.as_patient().unwrap().email, None);
}

#[test]
fn doctor_without_email_is_rejected() {
    let service = service();
    let mut body = doctor_body("No Mail", None);
    body.as_object_mut().unwrap().remove("email");

    let err = service.create_doctor(&body).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(matches!(
        err,
        RecordError::InvalidInput(ValidationError::MissingField { field: "email", .. })
    ));
    assert!(service.list_doctors().unwrap().is_empty());
}

#[test]
fn patient_without_emergency_phone_is_rejected() {
    let service = service();
    let mut body = patient_body("Jo Doe");
    body.as_object_mut().unwrap().remove("emergencyPhone");

    let err = service.create_patient(&body).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(service.list_patients().unwrap().is_empty());
}

#[test]
fn patient_accepts_dob_alias_and_plain_dates() {
    let service = service();
    let mut body = patient_body("Alias");
    let dob = body.as_object_mut().unwrap().remove("dateOfBirth").unwrap();
    body["dob"] = dob;

    let created = service.create_patient(&body).unwrap();
    assert_eq!(
        created.record.as_patient().unwrap().date_of_birth,
        Utc.with_ymd_and_hms(1990, 4, 12, 0, 0, 0).unwrap()
    );
}

#[test]
fn unparsable_date_is_a_store_error() {
    let service = service();
    let mut body = patient_body("Bad Date");
    body["dateOfBirth"] = json!("twelfth of April");

    let err = service.create_patient(&body).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StoreError);
    assert!(service.list_patients().unwrap().is_empty());
}

#[test]
fn body_with_identifier_or_unknown_field_is_rejected() {
    let service = service();

    let mut with_id = doctor_body("Id Setter", None);
    with_id["id"] = json!(7);
    assert_eq!(
        service.create_doctor(&with_id).unwrap_err().kind(),
        ErrorKind::InvalidInput
    );

    let mut with_extra = doctor_body("Extra", None);
    with_extra["salary"] = json!(1);
    assert_eq!(
        service.create_doctor(&with_extra).unwrap_err().kind(),
        ErrorKind::InvalidInput
    );
}

#[test]
fn appointment_with_missing_doctor_is_a_constraint_violation() {
    let service = service();
    let patient_id = create_patient(&service, "Jo Doe");

    let err = service
        .create_appointment(&json!({
            "doctorId": 999,
            "patientId": patient_id,
            "appointmentDate": "2024-05-01T09:30:00Z",
        }))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
    assert!(service.list_appointments().unwrap().is_empty());
}

#[test]
fn get_unknown_doctor_is_not_found() {
    let service = service();
    let err = service.get_doctor(42).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "Doctor not found: 42");
}

#[test]
fn update_and_delete_unknown_record_are_not_found() {
    let service = service();
    assert_eq!(
        service
            .update_doctor(5, &doctor_body("Ghost", None))
            .unwrap_err()
            .kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        service.delete_department(5).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn deleted_record_is_no_longer_readable() {
    let service = service();
    let patient_id = create_patient(&service, "Short Stay");

    service.delete_patient(patient_id).unwrap();
    assert_eq!(
        service.get_patient(patient_id).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        service.delete_patient(patient_id).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn deleting_a_referenced_doctor_is_rejected() {
    let service = service();
    let doctor_id = create_doctor(&service, "Busy Doctor");
    let patient_id = create_patient(&service, "Jo Doe");
    service
        .create_appointment(&json!({
            "doctorId": doctor_id,
            "patientId": patient_id,
            "appointmentDate": "2024-05-01T09:30:00Z",
        }))
        .unwrap();

    let err = service.delete_doctor(doctor_id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
    assert!(service.get_doctor(doctor_id).is_ok());
}

#[test]
fn department_detail_includes_head_and_members() {
    let service = service();
    let first = create_doctor(&service, "Dr One");

    let department = service
        .create_department(&json!({
            "name": "Cardiology",
            "location": "East wing",
            "headDoctorId": first,
        }))
        .unwrap();
    assert_eq!(
        department.one(Relation::DepartmentHeadDoctor).map(Expanded::id),
        Some(first)
    );
    assert!(!department.has_relation(Relation::DepartmentDoctors));

    let second = service
        .create_doctor(&doctor_body("Dr Two", Some(department.id())))
        .unwrap()
        .id();
    service
        .update_doctor(first, &doctor_body("Dr One", Some(department.id())))
        .unwrap();

    let detail = service.get_department(department.id()).unwrap();
    assert_eq!(
        detail.one(Relation::DepartmentHeadDoctor).map(Expanded::id),
        Some(first)
    );
    assert_eq!(ids(detail.many(Relation::DepartmentDoctors)), vec![first, second]);

    let listed = service.list_departments().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], detail);
}

#[test]
fn a_doctor_heads_at_most_one_department() {
    let service = service();
    let head = create_doctor(&service, "Dr Head");
    let body = |name: &str| json!({ "name": name, "location": "West", "headDoctorId": head });

    service.create_department(&body("Surgery")).unwrap();
    let err = service.create_department(&body("Oncology")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
}

#[test]
fn doctor_detail_expands_every_relation() {
    let service = service();
    let doctor_id = create_doctor(&service, "Dr Wide");
    let patient_id = create_patient(&service, "Jo Doe");
    let department = service
        .create_department(&json!({
            "name": "Pediatrics",
            "location": "North",
            "headDoctorId": doctor_id,
        }))
        .unwrap();
    service
        .create_appointment(&json!({
            "doctorId": doctor_id,
            "patientId": patient_id,
            "appointmentDate": "2024-05-01T09:30:00Z",
        }))
        .unwrap();
    service
        .create_prescription(&json!({
            "doctorId": doctor_id,
            "patientId": patient_id,
            "medicationName": "Amoxicillin",
            "dosage": "500mg",
            "frequency": "3x daily",
            "prescriptionDate": "2024-05-01",
        }))
        .unwrap();
    let clinic = service
        .create_clinic(&json!({ "name": "North", "address": "1 Main St", "phone": "555" }))
        .unwrap();
    service
        .create_doctor_clinic(&json!({
            "doctorId": doctor_id,
            "clinicId": clinic.id(),
            "consultationDays": "Mon,Wed",
            "consultationHours": "09:00-12:00",
        }))
        .unwrap();

    let detail = service.get_doctor(doctor_id).unwrap();
    assert_eq!(detail.relation_count(), 5);
    assert!(detail.one(Relation::DoctorDepartment).is_none());
    assert_eq!(
        detail.one(Relation::DoctorDepartmentHead).map(Expanded::id),
        Some(department.id())
    );
    assert_eq!(detail.many(Relation::DoctorAppointments).len(), 1);
    assert_eq!(detail.many(Relation::DoctorPrescriptions).len(), 1);

    let associations = detail.many(Relation::DoctorClinics);
    assert_eq!(associations.len(), 1);
    assert_eq!(
        associations[0].one(Relation::DoctorClinicClinic).map(Expanded::id),
        Some(clinic.id())
    );
}

#[test]
fn patient_reads_expand_only_on_detail() {
    let service = service();
    let doctor_id = create_doctor(&service, "Dr Care");
    let patient_id = create_patient(&service, "Jo Doe");
    service
        .create_appointment(&json!({
            "doctorId": doctor_id,
            "patientId": patient_id,
            "appointmentDate": "2024-05-01T09:30:00Z",
            "diagnosis": "Flu",
        }))
        .unwrap();

    let listed = service.list_patients().unwrap();
    assert_eq!(listed[0].relation_count(), 0);

    let detail = service.get_patient(patient_id).unwrap();
    assert_eq!(detail.many(Relation::PatientAppointments).len(), 1);
    assert!(detail.has_relation(Relation::PatientPrescriptions));
    assert!(detail.many(Relation::PatientPrescriptions).is_empty());
}

#[test]
fn appointments_and_prescriptions_carry_both_parties() {
    let service = service();
    let doctor_id = create_doctor(&service, "Dr Party");
    let patient_id = create_patient(&service, "Jo Doe");

    let appointment = service
        .create_appointment(&json!({
            "doctorId": doctor_id,
            "patientId": patient_id,
            "appointmentDate": "2024-05-01T09:30:00+02:00",
        }))
        .unwrap();
    assert_eq!(
        appointment.record.as_appointment().unwrap().appointment_date,
        Utc.with_ymd_and_hms(2024, 5, 1, 7, 30, 0).unwrap()
    );
    assert_eq!(
        appointment.one(Relation::AppointmentPatient).map(Expanded::id),
        Some(patient_id)
    );

    let prescription = service
        .create_prescription(&json!({
            "doctorId": doctor_id,
            "patientId": patient_id,
            "medicationName": "Ibuprofen",
            "dosage": "200mg",
            "frequency": "as needed",
            "prescriptionDate": "2024-05-01",
        }))
        .unwrap();
    assert!(prescription.record.as_prescription().unwrap().is_ongoing());

    let listed = service.list_prescriptions().unwrap();
    assert_eq!(
        listed[0].one(Relation::PrescriptionDoctor).map(Expanded::id),
        Some(doctor_id)
    );
    assert_eq!(
        service.list_appointments().unwrap()[0]
            .one(Relation::AppointmentDoctor)
            .map(Expanded::id),
        Some(doctor_id)
    );
}

#[test]
fn clinic_listing_nests_doctor_under_each_association() {
    let service = service();
    let doctor_id = create_doctor(&service, "Dr Roam");
    let created = service
        .create_clinic(&json!({ "name": "South", "address": "9 Bay Rd", "phone": "555" }))
        .unwrap();
    assert_eq!(created.relation_count(), 0);

    let association = service
        .create_doctor_clinic(&json!({
            "doctorId": doctor_id,
            "clinicId": created.id(),
            "consultationDays": "Fri",
            "consultationHours": "14:00-18:00",
        }))
        .unwrap();
    assert_eq!(
        association.one(Relation::DoctorClinicDoctor).map(Expanded::id),
        Some(doctor_id)
    );

    let clinics = service.list_clinics().unwrap();
    let associations = clinics[0].many(Relation::ClinicDoctorClinics);
    assert_eq!(associations.len(), 1);
    assert_eq!(
        associations[0].one(Relation::DoctorClinicDoctor).map(Expanded::id),
        Some(doctor_id)
    );
    assert!(!associations[0].has_relation(Relation::DoctorClinicClinic));
}

#[test]
fn association_with_unknown_clinic_is_a_constraint_violation() {
    let service = service();
    let doctor_id = create_doctor(&service, "Dr Lost");
    let err = service
        .create_doctor_clinic(&json!({
            "doctorId": doctor_id,
            "clinicId": 77,
            "consultationDays": "Fri",
            "consultationHours": "14:00-18:00",
        }))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
}

#[test]
fn expanded_records_serialize_as_flat_camel_case_json() {
    let service = service();
    let doctor_id = create_doctor(&service, "Dr Json");
    let department = service
        .create_department(&json!({
            "name": "Radiology",
            "location": "Basement",
            "headDoctorId": doctor_id,
        }))
        .unwrap();

    let value = serde_json::to_value(service.get_department(department.id()).unwrap()).unwrap();
    assert_eq!(value["name"], json!("Radiology"));
    assert_eq!(value["headDoctorId"], json!(doctor_id));
    assert_eq!(value["headDoctor"]["name"], json!("Dr Json"));
    assert_eq!(value["doctors"], json!([]));

    let doctor = serde_json::to_value(service.list_doctors().unwrap()).unwrap();
    assert_eq!(doctor[0]["department"], Value::Null);
    assert_eq!(doctor[0]["departmentId"], Value::Null);
}

#[test]
fn related_values_distinguish_one_and_many() {
    let service = service();
    let doctor_id = create_doctor(&service, "Dr Shape");
    let detail = service.get_doctor(doctor_id).unwrap();

    assert!(matches!(
        detail.related(Relation::DoctorDepartment),
        Some(Related::One(None))
    ));
    assert!(matches!(
        detail.related(Relation::DoctorAppointments),
        Some(Related::Many(rows)) if rows.is_empty()
    ));
    assert!(detail.related(Relation::PatientAppointments).is_none());
}

#[test]
fn file_backed_store_survives_close_and_reopen() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = clinic_core::ClinicConfig {
        db_path: Some(dir.path().join("clinic.db")),
        ..clinic_core::ClinicConfig::in_memory()
    };

    let service = RecordService::open(&config).expect("open file store");
    let doctor_id = create_doctor(&service, "Dr Durable");
    service.close().unwrap();

    let reopened = RecordService::open(&config).expect("reopen file store");
    assert_eq!(
        reopened.get_doctor(doctor_id).unwrap().record.as_doctor().unwrap().name,
        "Dr Durable"
    );
}

#[test]
fn whole_number_float_foreign_keys_are_accepted() {
    let service = service();
    let doctor_id = create_doctor(&service, "Dr Float");

    let department = service
        .create_department(&json!({
            "name": "Neurology",
            "location": "South",
            "headDoctorId": doctor_id as f64,
        }))
        .expect("float head doctor id is coerced");
    let row = department.record.as_department().expect("department row");
    assert_eq!(row.head_doctor_id, Some(doctor_id));

    let moved = service
        .update_doctor(
            doctor_id,
            &json!({
                "name": "Dr Float",
                "email": "float@clinic.test",
                "phone": "555",
                "specialization": "Neurology",
                "departmentId": format!("{}.0", department.id()),
            }),
        )
        .expect("string float department id is coerced");
    assert_eq!(
        moved.record.as_doctor().expect("doctor row").department_id,
        Some(department.id())
    );
}

#[test]
fn moving_a_doctor_to_a_missing_department_is_rejected() {
    let service = service();
    let doctor_id = create_doctor(&service, "Dr Stay");

    let err = service
        .update_doctor(doctor_id, &doctor_body("Dr Stay", Some(99)))
        .expect_err("department 99 does not exist");
    assert_eq!(err.kind(), ErrorKind::ConstraintViolation);

    let stored = service.get_doctor(doctor_id).expect("doctor still readable");
    assert_eq!(stored.record.as_doctor().expect("doctor row").department_id, None);
}

#[test]
fn department_with_missing_head_doctor_is_rejected() {
    let service = service();
    let err = service
        .create_department(&json!({
            "name": "Ghost Ward",
            "location": "Nowhere",
            "headDoctorId": 555,
        }))
        .expect_err("doctor 555 does not exist");
    assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
    assert!(service.list_departments().expect("list departments").is_empty());
}

#[test]
fn deleting_a_department_with_doctors_is_rejected() {
    let service = service();
    let department = service
        .create_department(&json!({ "name": "Staffed", "location": "East" }))
        .expect("create department");
    service
        .create_doctor(&doctor_body("Dr Member", Some(department.id())))
        .expect("create member doctor");

    let err = service
        .delete_department(department.id())
        .expect_err("department still has doctors");
    assert_eq!(err.kind(), ErrorKind::ConstraintViolation);

    let detail = service
        .get_department(department.id())
        .expect("department survives");
    assert_eq!(detail.many(Relation::DepartmentDoctors).len(), 1);
}

#[test]
fn clinic_and_association_rows_are_typed() {
    let service = service();
    let doctor_id = create_doctor(&service, "Dr Typed");
    let clinic = service
        .create_clinic(&json!({ "name": "Hill", "address": "4 Top Rd", "phone": "555-0400" }))
        .expect("create clinic");
    let clinic_row = clinic.record.as_clinic().expect("clinic row");
    assert_eq!(clinic_row.address, "4 Top Rd");
    assert!(clinic.record.as_doctor().is_none());

    let association = service
        .create_doctor_clinic(&json!({
            "doctorId": doctor_id,
            "clinicId": clinic.id(),
            "consultationDays": "Thu",
            "consultationHours": "10:00-16:00",
        }))
        .expect("create association");
    let row = association
        .record
        .as_doctor_clinic()
        .expect("association row");
    assert_eq!((row.doctor_id, row.clinic_id), (doctor_id, clinic.id()));
    assert_eq!(row.consultation_hours, "10:00-16:00");
    assert!(association.record.as_department().is_none());
}

#[test]
fn service_connection_enforces_foreign_keys() {
    let service = service();
    create_doctor(&service, "Dr Counted");

    let enforced: i64 = service
        .connection()
        .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
        .expect("read foreign_keys pragma");
    assert_eq!(enforced, 1);

    let doctors: i64 = service
        .connection()
        .query_row("SELECT COUNT(*) FROM doctors", [], |row| row.get(0))
        .expect("count doctors");
    assert_eq!(doctors, 1);
}

#[test]
fn timestamps_serialize_with_millisecond_precision() {
    let service = service();
    let patient_id = create_patient(&service, "Jo Millis");

    let value = serde_json::to_value(service.get_patient(patient_id).expect("get patient"))
        .expect("serialize patient");
    assert_eq!(value["dateOfBirth"], json!("1990-04-12T00:00:00.000Z"));
}
