use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ClassLabel;

/// The in-memory result of one upload, held in the session's
/// "last result" slot and overwritten by each new upload. Only what
/// is copied into a `Diagnosis` row survives the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisOutcome {
    pub diagnosis_id: i64,
    pub label: ClassLabel,
    /// Maximum class probability as a percentage, rounded to 2 decimals.
    pub confidence_percent: f64,
    pub patient_id: String,
    pub patient_name: String,
    pub gender: String,
    pub date_of_birth: NaiveDate,
    /// Stored filename of the uploaded scan, under the uploads directory.
    pub image_name: String,
    /// Stored filename of the heatmap overlay; `None` when the explainer
    /// soft-failed and only the textual diagnosis is available.
    pub heatmap_name: Option<String>,
    /// Submission timestamp, RFC 3339.
    pub scan_time: String,
}
