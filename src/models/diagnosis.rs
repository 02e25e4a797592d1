use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One archived screening result. Insert-only: rows are never
/// updated or deleted. Patient name and id are denormalized so a
/// report can be rebuilt from this row alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnosis {
    pub id: i64,
    pub patient_name: String,
    pub patient_id: String,
    pub doctor_name: String,
    pub scan_date: NaiveDate,
    pub result: Option<String>,
}
