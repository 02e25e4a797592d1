//! Scan upload and diagnosis.
//!
//! `POST /api/diagnoses` - multipart form with patient demographics and
//! the OCT image. Validation happens in order: all fields present, image
//! extension allowed, date of birth parseable. Only then does any model
//! work or database write begin.

use axum::extract::{Multipart, State};
use axum::{Extension, Json};
use chrono::NaiveDate;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, DoctorContext};
use crate::inference::{run_diagnosis, DiagnosisRequest};
use crate::models::DiagnosisOutcome;
use crate::storage;

/// Multipart field names, matching the upload form.
const FIELD_NAME: &str = "fname";
const FIELD_PATIENT_ID: &str = "id";
const FIELD_GENDER: &str = "gender";
const FIELD_DOB: &str = "dateOfBirth";
const FIELD_IMAGE: &str = "uploadImage";

#[derive(Default)]
struct UploadForm {
    patient_name: Option<String>,
    patient_id: Option<String>,
    gender: Option<String>,
    date_of_birth: Option<String>,
    image_filename: Option<String>,
    image_bytes: Option<Vec<u8>>,
}

/// `POST /api/diagnoses`
pub async fn upload(
    State(ctx): State<ApiContext>,
    Extension(doctor): Extension<DoctorContext>,
    multipart: Multipart,
) -> Result<Json<DiagnosisOutcome>, ApiError> {
    let form = read_form(multipart).await?;

    let patient_name = required_field(form.patient_name, "patient name")?;
    let patient_id = required_field(form.patient_id, "patient ID")?;
    let gender = required_field(form.gender, "gender")?;
    let dob_raw = required_field(form.date_of_birth, "date of birth")?;

    let image_filename = form
        .image_filename
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::BadRequest("OCT image is required".into()))?;
    let image_bytes = form
        .image_bytes
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| ApiError::BadRequest("OCT image is required".into()))?;

    if !storage::allowed_extension(&image_filename) {
        return Err(ApiError::UnsupportedMedia(
            "Only PNG/JPG images are allowed".into(),
        ));
    }

    let date_of_birth = NaiveDate::parse_from_str(&dob_raw, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest("Invalid date format".into()))?;

    let outcome = {
        let conn = ctx.core.lock_db()?;
        run_diagnosis(
            &conn,
            ctx.core.classifier.as_ref(),
            &ctx.core.uploads,
            &doctor.doctor_name,
            DiagnosisRequest {
                patient_name,
                patient_id,
                gender,
                date_of_birth,
                image_filename,
                image_bytes,
            },
        )?
    };

    {
        let mut sessions = ctx
            .sessions
            .lock()
            .map_err(|_| ApiError::Internal("session lock".into()))?;
        sessions.set_last_outcome(&doctor.session_key, outcome.clone());
    }

    Ok(Json(outcome))
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            FIELD_IMAGE => {
                form.image_filename = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read image: {e}")))?;
                form.image_bytes = Some(bytes.to_vec());
            }
            FIELD_NAME | FIELD_PATIENT_ID | FIELD_GENDER | FIELD_DOB => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Malformed field {name}: {e}")))?
                    .trim()
                    .to_string();
                match name.as_str() {
                    FIELD_NAME => form.patient_name = Some(value),
                    FIELD_PATIENT_ID => form.patient_id = Some(value),
                    FIELD_GENDER => form.gender = Some(value),
                    _ => form.date_of_birth = Some(value),
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

fn required_field(value: Option<String>, what: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("Missing {what}")))
}
