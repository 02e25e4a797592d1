//! Diagnosis history.
//!
//! `GET /api/history` - the most recent diagnoses, newest first,
//! capped at the configured limit.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::config::HISTORY_LIMIT;
use crate::db::repository::diagnosis;

#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub patient_name: String,
    pub patient_id: String,
    pub doctor_name: String,
    pub result: String,
    pub scan_time: String,
}

/// `GET /api/history`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let rows = {
        let conn = ctx.core.lock_db()?;
        diagnosis::recent_diagnoses(&conn, HISTORY_LIMIT)?
    };

    let entries = rows
        .into_iter()
        .map(|d| HistoryEntry {
            id: d.id,
            patient_name: d.patient_name,
            patient_id: d.patient_id,
            doctor_name: d.doctor_name,
            result: d.result.unwrap_or_default(),
            scan_time: d.scan_date.to_string(),
        })
        .collect();

    Ok(Json(entries))
}
