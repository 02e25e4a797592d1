//! Login and logout.
//!
//! `POST /api/auth/login` - exchange doctor id + password for a session token
//! `POST /api/auth/logout` - drop the session
//!
//! No lockout and no rate limiting: the service sits on a clinic-local
//! network with provisioned accounts.

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, DoctorContext, DoctorSession};
use crate::db::repository::doctor;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub id: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub doctor_name: String,
    pub specialization: String,
}

/// `POST /api/auth/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let doctor_id = request.id.trim();
    if doctor_id.is_empty() || request.password.is_empty() {
        return Err(ApiError::BadRequest("Missing ID or password".into()));
    }

    let doctor = {
        let conn = ctx.core.lock_db()?;
        doctor::find_by_doctor_id(&conn, doctor_id)?
    }
    .ok_or(ApiError::InvalidCredentials)?;

    if !verify_password(&request.password, &doctor.password_hash) {
        return Err(ApiError::InvalidCredentials);
    }

    let token = {
        let mut sessions = ctx
            .sessions
            .lock()
            .map_err(|_| ApiError::Internal("session lock".into()))?;
        sessions.create(DoctorSession {
            doctor_id: doctor.doctor_id.clone(),
            doctor_name: doctor.doctor_name.clone(),
            specialization: doctor.specialization.clone(),
            last_outcome: None,
        })
    };

    tracing::info!(doctor_id = %doctor.doctor_id, "doctor logged in");

    Ok(Json(LoginResponse {
        token,
        doctor_name: doctor.doctor_name,
        specialization: doctor.specialization,
    }))
}

/// `POST /api/auth/logout`
pub async fn logout(
    State(ctx): State<ApiContext>,
    Extension(doctor): Extension<DoctorContext>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut sessions = ctx
        .sessions
        .lock()
        .map_err(|_| ApiError::Internal("session lock".into()))?;
    sessions.remove(&doctor.session_key);

    Ok(Json(serde_json::json!({ "ok": true })))
}

/// Hash a password into a PHC string for storage.
/// Used by provisioning scripts and tests; login only verifies.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    use pbkdf2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
    use pbkdf2::Pbkdf2;

    let salt = SaltString::generate(&mut OsRng);
    Pbkdf2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

/// Constant-shape verification of a password against a stored PHC string.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    use pbkdf2::password_hash::{PasswordHash, PasswordVerifier};
    use pbkdf2::Pbkdf2;

    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Pbkdf2.verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}
