//! Session-scoped result views.
//!
//! `GET /api/results` - summary of the session's most recent diagnosis
//! `GET /api/report` - full report context for the same outcome
//!
//! Both read the session's last-result slot; nothing here touches the
//! database or the model.

use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, DoctorContext};
use crate::models::DiagnosisOutcome;
use crate::report::ReportContext;

#[derive(Debug, Serialize)]
pub struct ResultsView {
    pub patient_id: String,
    pub patient_name: String,
    pub image_name: String,
    pub label: String,
}

/// `GET /api/results`
pub async fn results(
    State(ctx): State<ApiContext>,
    Extension(doctor): Extension<DoctorContext>,
) -> Result<Json<ResultsView>, ApiError> {
    let outcome = last_outcome(&ctx, &doctor)?;
    Ok(Json(ResultsView {
        patient_id: outcome.patient_id,
        patient_name: outcome.patient_name,
        image_name: outcome.image_name,
        label: outcome.label.as_str().to_string(),
    }))
}

/// `GET /api/report`
pub async fn report(
    State(ctx): State<ApiContext>,
    Extension(doctor): Extension<DoctorContext>,
) -> Result<Json<ReportContext>, ApiError> {
    let outcome = last_outcome(&ctx, &doctor)?;
    Ok(Json(ReportContext::from_outcome(&outcome)))
}

fn last_outcome(ctx: &ApiContext, doctor: &DoctorContext) -> Result<DiagnosisOutcome, ApiError> {
    let sessions = ctx
        .sessions
        .lock()
        .map_err(|_| ApiError::Internal("session lock".into()))?;
    sessions
        .last_outcome(&doctor.session_key)
        .ok_or_else(|| ApiError::NotFound("No diagnosis in this session yet".into()))
}
