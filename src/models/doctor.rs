use serde::{Deserialize, Serialize};

/// A provisioned clinician account. Rows are created out-of-band
/// (there is no signup endpoint) and read at login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub doctor_id: String,
    pub doctor_name: String,
    /// PHC-format password hash, never the password itself.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub specialization: String,
    pub phone: Option<String>,
}
