use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::Patient;

/// Insert-or-update keyed by the clinic patient id. A repeated upsert
/// leaves exactly one row carrying the latest demographics.
pub fn upsert_patient(
    conn: &Connection,
    patient_id: &str,
    patient_name: &str,
    gender: &str,
    date_of_birth: NaiveDate,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (patient_id, patient_name, gender, date_of_birth)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(patient_id) DO UPDATE SET
             patient_name = excluded.patient_name,
             gender = excluded.gender,
             date_of_birth = excluded.date_of_birth",
        params![patient_id, patient_name, gender, date_of_birth],
    )?;
    Ok(())
}

pub fn find_by_patient_id(
    conn: &Connection,
    patient_id: &str,
) -> Result<Option<Patient>, DatabaseError> {
    let patient = conn
        .query_row(
            "SELECT id, patient_id, patient_name, gender, date_of_birth
             FROM patients WHERE patient_id = ?1",
            params![patient_id],
            |row| {
                Ok(Patient {
                    id: row.get(0)?,
                    patient_id: row.get(1)?,
                    patient_name: row.get(2)?,
                    gender: row.get(3)?,
                    date_of_birth: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(patient)
}
