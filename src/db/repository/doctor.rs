use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::Doctor;

/// Provision a doctor account. Not reachable from the HTTP surface;
/// used by provisioning scripts and tests.
pub fn insert_doctor(conn: &Connection, doc: &Doctor) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (doctor_id, doctor_name, password_hash, specialization, phone)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            doc.doctor_id,
            doc.doctor_name,
            doc.password_hash,
            doc.specialization,
            doc.phone,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_doctor_id(
    conn: &Connection,
    doctor_id: &str,
) -> Result<Option<Doctor>, DatabaseError> {
    let doctor = conn
        .query_row(
            "SELECT id, doctor_id, doctor_name, password_hash, specialization, phone
             FROM doctors WHERE doctor_id = ?1",
            params![doctor_id],
            |row| {
                Ok(Doctor {
                    id: row.get(0)?,
                    doctor_id: row.get(1)?,
                    doctor_name: row.get(2)?,
                    password_hash: row.get(3)?,
                    specialization: row.get(4)?,
                    phone: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(doctor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    fn sample_doctor() -> Doctor {
        Doctor {
            id: 0,
            doctor_id: "D-100".into(),
            doctor_name: "Dr. Amal Hassan".into(),
            password_hash: "$pbkdf2-sha256$test".into(),
            specialization: "Ophthalmology".into(),
            phone: Some("555-0142".into()),
        }
    }

    #[test]
    fn insert_and_find_doctor() {
        let conn = open_memory_database().unwrap();
        insert_doctor(&conn, &sample_doctor()).unwrap();

        let found = find_by_doctor_id(&conn, "D-100").unwrap().unwrap();
        assert_eq!(found.doctor_name, "Dr. Amal Hassan");
        assert_eq!(found.specialization, "Ophthalmology");
    }

    #[test]
    fn unknown_doctor_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(find_by_doctor_id(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn duplicate_doctor_id_rejected() {
        let conn = open_memory_database().unwrap();
        insert_doctor(&conn, &sample_doctor()).unwrap();
        assert!(insert_doctor(&conn, &sample_doctor()).is_err());
    }
}
