//! Shared types for the API layer: context, sessions, and tokens.
//!
//! A session is the per-login typed context: the doctor's identity plus
//! the "last result" slot that the results and report views read. The
//! slot is overwritten by each new upload and dies with the session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::models::DiagnosisOutcome;
use crate::state::AppState;

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<AppState>,
    pub sessions: Arc<Mutex<SessionStore>>,
}

impl ApiContext {
    pub fn new(core: Arc<AppState>) -> Self {
        Self {
            core,
            sessions: Arc::new(Mutex::new(SessionStore::new())),
        }
    }
}

/// Authenticated doctor context, injected into request extensions by
/// the auth middleware after token validation.
#[derive(Debug, Clone)]
pub struct DoctorContext {
    pub session_key: SessionKey,
    pub doctor_id: String,
    pub doctor_name: String,
    pub specialization: String,
}

/// SHA-256 of a bearer token; the server never stores the token itself.
pub type SessionKey = [u8; 32];

/// One logged-in doctor.
#[derive(Debug, Clone)]
pub struct DoctorSession {
    pub doctor_id: String,
    pub doctor_name: String,
    pub specialization: String,
    pub last_outcome: Option<DiagnosisOutcome>,
}

/// In-memory session store keyed by token hash.
#[derive(Default)]
pub struct SessionStore {
    sessions: HashMap<SessionKey, DoctorSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session and return the bearer token the client keeps.
    pub fn create(&mut self, session: DoctorSession) -> String {
        let token = generate_token();
        self.sessions.insert(hash_token(&token), session);
        token
    }

    /// Resolve a presented token to its session, if any.
    pub fn validate(&self, token: &str) -> Option<(SessionKey, &DoctorSession)> {
        let key = hash_token(token);
        self.sessions.get(&key).map(|s| (key, s))
    }

    pub fn remove(&mut self, key: &SessionKey) {
        self.sessions.remove(key);
    }

    /// Overwrite the session's last-result slot.
    pub fn set_last_outcome(&mut self, key: &SessionKey, outcome: DiagnosisOutcome) {
        if let Some(session) = self.sessions.get_mut(key) {
            session.last_outcome = Some(outcome);
        }
    }

    pub fn last_outcome(&self, key: &SessionKey) -> Option<DiagnosisOutcome> {
        self.sessions.get(key).and_then(|s| s.last_outcome.clone())
    }
}

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> SessionKey {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClassLabel;

    fn session() -> DoctorSession {
        DoctorSession {
            doctor_id: "D-100".into(),
            doctor_name: "Dr. Amal Hassan".into(),
            specialization: "Ophthalmology".into(),
            last_outcome: None,
        }
    }

    fn outcome(patient_id: &str) -> DiagnosisOutcome {
        DiagnosisOutcome {
            diagnosis_id: 1,
            label: ClassLabel::Dme,
            confidence_percent: 92.0,
            patient_id: patient_id.into(),
            patient_name: "Layla Karim".into(),
            gender: "Female".into(),
            date_of_birth: chrono::NaiveDate::parse_from_str("1990-04-12", "%Y-%m-%d").unwrap(),
            image_name: "scan.png".into(),
            heatmap_name: Some("heatmap_scan.png".into()),
            scan_time: "2026-02-10T09:30:00+00:00".into(),
        }
    }

    #[test]
    fn created_token_validates() {
        let mut store = SessionStore::new();
        let token = store.create(session());

        let (_, resolved) = store.validate(&token).unwrap();
        assert_eq!(resolved.doctor_name, "Dr. Amal Hassan");
    }

    #[test]
    fn wrong_token_rejected() {
        let mut store = SessionStore::new();
        store.create(session());
        assert!(store.validate("not-a-token").is_none());
    }

    #[test]
    fn removed_session_no_longer_validates() {
        let mut store = SessionStore::new();
        let token = store.create(session());
        let (key, _) = store.validate(&token).unwrap();

        store.remove(&key);
        assert!(store.validate(&token).is_none());
    }

    #[test]
    fn last_outcome_slot_overwritten_by_newer_upload() {
        let mut store = SessionStore::new();
        let token = store.create(session());
        let (key, _) = store.validate(&token).unwrap();

        assert!(store.last_outcome(&key).is_none());

        store.set_last_outcome(&key, outcome("P-001"));
        store.set_last_outcome(&key, outcome("P-002"));

        let last = store.last_outcome(&key).unwrap();
        assert_eq!(last.patient_id, "P-002");
    }

    #[test]
    fn sessions_are_isolated() {
        let mut store = SessionStore::new();
        let token_a = store.create(session());
        let token_b = store.create(session());
        let (key_a, _) = store.validate(&token_a).unwrap();
        let (key_b, _) = store.validate(&token_b).unwrap();

        store.set_last_outcome(&key_a, outcome("P-001"));
        assert!(store.last_outcome(&key_b).is_none());
    }

    #[test]
    fn generate_token_is_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn hash_token_is_deterministic() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
    }
}
