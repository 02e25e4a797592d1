use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::Diagnosis;

/// Archive one screening result. Returns the new row id.
/// The referenced patient row must already exist (upsert first).
pub fn insert_diagnosis(
    conn: &Connection,
    patient_name: &str,
    patient_id: &str,
    doctor_name: &str,
    scan_date: NaiveDate,
    result: &str,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO diagnoses (patient_name, patient_id, doctor_name, scan_date, result)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![patient_name, patient_id, doctor_name, scan_date, result],
    )?;
    Ok(conn.last_insert_rowid())
}

/// The most recent diagnoses, newest first by insertion order,
/// bounded by `limit`.
pub fn recent_diagnoses(conn: &Connection, limit: usize) -> Result<Vec<Diagnosis>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_name, patient_id, doctor_name, scan_date, result
         FROM diagnoses ORDER BY id DESC LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit as i64], row_to_diagnosis)?;

    let mut diagnoses = Vec::new();
    for row in rows {
        diagnoses.push(row?);
    }
    Ok(diagnoses)
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Diagnosis>, DatabaseError> {
    let diagnosis = conn
        .query_row(
            "SELECT id, patient_name, patient_id, doctor_name, scan_date, result
             FROM diagnoses WHERE id = ?1",
            params![id],
            row_to_diagnosis,
        )
        .optional()?;
    Ok(diagnosis)
}

fn row_to_diagnosis(row: &Row<'_>) -> rusqlite::Result<Diagnosis> {
    Ok(Diagnosis {
        id: row.get(0)?,
        patient_name: row.get(1)?,
        patient_id: row.get(2)?,
        doctor_name: row.get(3)?,
        scan_date: row.get(4)?,
        result: row.get(5)?,
    })
}
