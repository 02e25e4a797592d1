use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A patient record, keyed by the clinic-assigned patient id.
/// Upserted on every submitted diagnosis so demographics track
/// the latest submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub patient_id: String,
    pub patient_name: String,
    pub gender: String,
    pub date_of_birth: NaiveDate,
}
