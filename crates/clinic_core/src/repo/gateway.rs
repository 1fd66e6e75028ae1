//! Record gateway contract and SQLite implementation.
//!
//! # Responsibility
//! - Translate validated writes into single SQL statements.
//! - Read records back and resolve requested relations.
//!
//! # Invariants
//! - Writes only accept [`EntityInput`] values built by the validation layer.
//! - Create and update read the written row back inside the same transaction.
//! - A missing row is reported as `NotFound`, never as an empty success.
//! - Lists and to-many relations are ordered by ascending id, which is
//!   insertion order.

use crate::db::ensure_connection_ready;
use crate::error::{RecordError, RecordResult};
use crate::model::input::{EntityInput, FieldValue};
use crate::model::records::{
    Appointment, Clinic, Department, Doctor, DoctorClinic, Expanded, Patient, Prescription,
    Record, RecordId, Related,
};
use crate::model::schema::{Cardinality, EntityKind, Expand, FieldSpec, Join};
use crate::model::timestamp::format_timestamp;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};

/// Persistence operations over every entity type.
pub trait RecordGateway {
    /// Inserts a new row and returns it with `expand` resolved.
    fn create(&self, input: &EntityInput, expand: &[Expand]) -> RecordResult<Expanded>;
    /// Fetches one row with `expand` resolved.
    fn get_by_id(&self, entity: EntityKind, id: RecordId, expand: &[Expand])
        -> RecordResult<Expanded>;
    /// Fetches every row of `entity`, each expanded identically.
    fn list_all(&self, entity: EntityKind, expand: &[Expand]) -> RecordResult<Vec<Expanded>>;
    /// Overwrites every field of an existing row.
    fn update(&self, id: RecordId, input: &EntityInput, expand: &[Expand])
        -> RecordResult<Expanded>;
    /// Physically removes one row.
    fn delete(&self, entity: EntityKind, id: RecordId) -> RecordResult<()>;
}

/// SQLite-backed record gateway.
pub struct SqliteRecordGateway<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordGateway<'conn> {
    /// Wraps a connection already verified by [`ensure_connection_ready`].
    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Constructs a gateway after checking that the connection is migrated.
    pub fn try_new(conn: &'conn Connection) -> RecordResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn find(&self, entity: EntityKind, id: RecordId) -> RecordResult<Option<Record>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?1;",
            entity.select_columns(),
            entity.table()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_record(entity, row)?)),
            None => Ok(None),
        }
    }

    fn select_where(
        &self,
        entity: EntityKind,
        filter: Option<(&str, RecordId)>,
    ) -> RecordResult<Vec<Record>> {
        let mut sql = format!("SELECT {} FROM {}", entity.select_columns(), entity.table());
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some((column, value)) = filter {
            sql.push_str(&format!(" WHERE {column} = ?1"));
            bind_values.push(Value::Integer(value));
        }
        sql.push_str(" ORDER BY id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record(entity, row)?);
        }
        Ok(records)
    }

    fn expand(&self, record: Record, expand: &[Expand]) -> RecordResult<Expanded> {
        let mut expanded = Expanded::new(record);
        for node in expand {
            let spec = node.relation.spec();
            if spec.owner != expanded.kind() {
                return Err(RecordError::InvalidData(format!(
                    "relation `{}` belongs to {}, not {}",
                    spec.key,
                    spec.owner,
                    expanded.kind()
                )));
            }

            let targets: Vec<Record> = match spec.join {
                Join::Outgoing(column) => match expanded.record.foreign_key(column) {
                    Some(target_id) => self.find(spec.target, target_id)?.into_iter().collect(),
                    None => Vec::new(),
                },
                Join::Incoming(column) => {
                    self.select_where(spec.target, Some((column, expanded.id())))?
                }
            };

            let mut resolved = targets
                .into_iter()
                .map(|target| self.expand(target, node.nested))
                .collect::<RecordResult<Vec<_>>>()?;

            let related = match spec.cardinality {
                Cardinality::One => Related::One(if resolved.is_empty() {
                    None
                } else {
                    Some(Box::new(resolved.swap_remove(0)))
                }),
                Cardinality::Many => Related::Many(resolved),
            };
            expanded.insert(node.relation, related);
        }
        Ok(expanded)
    }
}

impl RecordGateway for SqliteRecordGateway<'_> {
    fn create(&self, input: &EntityInput, expand: &[Expand]) -> RecordResult<Expanded> {
        let entity = input.entity();
        let (columns, values) = bind_input(input)?;
        let placeholders = (1..=columns.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders});",
            entity.table(),
            columns.join(", ")
        );

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(&sql, params_from_iter(values))?;
        let id = tx.last_insert_rowid();
        let created = self.get_by_id(entity, id, expand)?;
        tx.commit()?;
        Ok(created)
    }

    fn get_by_id(
        &self,
        entity: EntityKind,
        id: RecordId,
        expand: &[Expand],
    ) -> RecordResult<Expanded> {
        let record = self
            .find(entity, id)?
            .ok_or(RecordError::NotFound { entity, id })?;
        self.expand(record, expand)
    }

    fn list_all(&self, entity: EntityKind, expand: &[Expand]) -> RecordResult<Vec<Expanded>> {
        self.select_where(entity, None)?
            .into_iter()
            .map(|record| self.expand(record, expand))
            .collect()
    }

    fn update(
        &self,
        id: RecordId,
        input: &EntityInput,
        expand: &[Expand],
    ) -> RecordResult<Expanded> {
        let entity = input.entity();
        let (columns, mut values) = bind_input(input)?;
        let assignments = columns
            .iter()
            .enumerate()
            .map(|(index, column)| format!("{column} = ?{}", index + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE id = ?{};",
            entity.table(),
            columns.len() + 1
        );
        values.push(Value::Integer(id));

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(&sql, params_from_iter(values))?;
        if changed == 0 {
            return Err(RecordError::NotFound { entity, id });
        }
        let updated = self.get_by_id(entity, id, expand)?;
        tx.commit()?;
        Ok(updated)
    }

    fn delete(&self, entity: EntityKind, id: RecordId) -> RecordResult<()> {
        let changed = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1;", entity.table()),
            [id],
        )?;
        if changed == 0 {
            return Err(RecordError::NotFound { entity, id });
        }
        Ok(())
    }
}

fn bind_input(input: &EntityInput) -> RecordResult<(Vec<&'static str>, Vec<Value>)> {
    let mut columns = Vec::with_capacity(input.values().len());
    let mut values = Vec::with_capacity(input.values().len());
    for (field, value) in input.values() {
        columns.push(field.column);
        values.push(bind_value(field, value)?);
    }
    Ok((columns, values))
}

fn bind_value(field: &FieldSpec, value: &FieldValue) -> RecordResult<Value> {
    Ok(match value {
        FieldValue::Text(text) => Value::Text(text.clone()),
        FieldValue::Id(id) => Value::Integer(*id),
        FieldValue::DateTime(raw) => {
            Value::Text(format_timestamp(parse_input_timestamp(field, raw)?))
        }
        FieldValue::Null => Value::Null,
    })
}

/// Accepts an RFC 3339 date-time or a bare `YYYY-MM-DD` date (midnight UTC).
fn parse_input_timestamp(field: &FieldSpec, raw: &str) -> RecordResult<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| Utc.from_utc_datetime(&midnight))
        .ok_or_else(|| {
            RecordError::InvalidData(format!(
                "invalid date-time `{trimmed}` for field `{}`",
                field.name
            ))
        })
}

fn parse_record(entity: EntityKind, row: &Row<'_>) -> RecordResult<Record> {
    let record = match entity {
        EntityKind::Doctor => Record::Doctor(Doctor {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            phone: row.get("phone")?,
            specialization: row.get("specialization")?,
            department_id: row.get("department_id")?,
        }),
        EntityKind::Patient => Record::Patient(Patient {
            id: row.get("id")?,
            name: row.get("name")?,
            date_of_birth: stored_timestamp(row, "patients", "date_of_birth")?,
            phone: row.get("phone")?,
            email: row.get("email")?,
            address: row.get("address")?,
            emergency_contact: row.get("emergency_contact")?,
            emergency_phone: row.get("emergency_phone")?,
        }),
        EntityKind::Appointment => Record::Appointment(Appointment {
            id: row.get("id")?,
            doctor_id: row.get("doctor_id")?,
            patient_id: row.get("patient_id")?,
            appointment_date: stored_timestamp(row, "appointments", "appointment_date")?,
            diagnosis: row.get("diagnosis")?,
            treatment_plan: row.get("treatment_plan")?,
        }),
        EntityKind::Prescription => Record::Prescription(Prescription {
            id: row.get("id")?,
            patient_id: row.get("patient_id")?,
            doctor_id: row.get("doctor_id")?,
            medication_name: row.get("medication_name")?,
            dosage: row.get("dosage")?,
            frequency: row.get("frequency")?,
            prescription_date: stored_timestamp(row, "prescriptions", "prescription_date")?,
            prescription_end_date: optional_stored_timestamp(
                row,
                "prescriptions",
                "prescription_end_date",
            )?,
        }),
        EntityKind::Clinic => Record::Clinic(Clinic {
            id: row.get("id")?,
            name: row.get("name")?,
            address: row.get("address")?,
            phone: row.get("phone")?,
        }),
        EntityKind::Department => Record::Department(Department {
            id: row.get("id")?,
            name: row.get("name")?,
            location: row.get("location")?,
            head_doctor_id: row.get("head_doctor_id")?,
        }),
        EntityKind::DoctorClinic => Record::DoctorClinic(DoctorClinic {
            id: row.get("id")?,
            doctor_id: row.get("doctor_id")?,
            clinic_id: row.get("clinic_id")?,
            consultation_days: row.get("consultation_days")?,
            consultation_hours: row.get("consultation_hours")?,
        }),
    };
    Ok(record)
}

fn stored_timestamp(row: &Row<'_>, table: &str, column: &str) -> RecordResult<DateTime<Utc>> {
    let text: String = row.get(column)?;
    parse_stored_timestamp(table, column, &text)
}

fn optional_stored_timestamp(
    row: &Row<'_>,
    table: &str,
    column: &str,
) -> RecordResult<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(column)? {
        Some(text) => Ok(Some(parse_stored_timestamp(table, column, &text)?)),
        None => Ok(None),
    }
}

fn parse_stored_timestamp(table: &str, column: &str, text: &str) -> RecordResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| {
            RecordError::InvalidData(format!("invalid timestamp `{text}` in {table}.{column}"))
        })
}
