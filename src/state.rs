//! Shared application state: the database connection, the loaded
//! classifier (read-only after startup), and the upload store.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use thiserror::Error;

use crate::inference::OctClassifier;
use crate::storage::UploadStore;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("database lock poisoned")]
    LockPoisoned,
}

pub struct AppState {
    db: Mutex<Connection>,
    pub classifier: Arc<dyn OctClassifier>,
    pub uploads: UploadStore,
}

impl AppState {
    pub fn new(db: Connection, classifier: Arc<dyn OctClassifier>, uploads: UploadStore) -> Self {
        Self {
            db: Mutex::new(db),
            classifier,
            uploads,
        }
    }

    /// Lock the database connection for one request's worth of work.
    pub fn lock_db(&self) -> Result<MutexGuard<'_, Connection>, StateError> {
        self.db.lock().map_err(|_| StateError::LockPoisoned)
    }
}
