//! On-demand report download for archived diagnoses.
//!
//! `GET /api/reports/:id` - rebuild the HTML report for a historical
//! diagnosis from its database row and serve it as an attachment.
//! Historical rows carry no confidence or image references, so those
//! sections render empty (accepted limitation of the archive format).

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::Html;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::{diagnosis, patient};
use crate::report::{download_filename, render_html, ReportContext};

/// `GET /api/reports/:id`
pub async fn download(
    State(ctx): State<ApiContext>,
    Path(diagnosis_id): Path<i64>,
) -> Result<(HeaderMap, Html<String>), ApiError> {
    let (record, patient) = {
        let conn = ctx.core.lock_db()?;
        let record = diagnosis::find_by_id(&conn, diagnosis_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Diagnosis {diagnosis_id} not found")))?;
        let patient = patient::find_by_patient_id(&conn, &record.patient_id)?;
        (record, patient)
    };

    let context = ReportContext::from_record(&record, patient.as_ref());
    let html = render_html(&context);

    let mut headers = HeaderMap::new();
    let disposition = format!(
        "attachment; filename=\"{}\"",
        download_filename(&record.patient_id, record.id)
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .map_err(|e| ApiError::Internal(format!("header encoding: {e}")))?,
    );

    Ok((headers, Html(html)))
}
