use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use deepsight::api::server::start_server;
use deepsight::inference::OctClassifier;
use deepsight::state::AppState;
use deepsight::storage::UploadStore;
use deepsight::{config, db, inference, storage};

#[derive(Error, Debug)]
enum StartupError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Database(#[from] db::DatabaseError),

    #[error(transparent)]
    Storage(#[from] storage::StorageError),

    #[error(transparent)]
    Inference(#[from] inference::InferenceError),

    #[cfg(not(feature = "onnx"))]
    #[error("built without the `onnx` feature; no classifier backend available")]
    NoBackend,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    if let Err(e) = run().await {
        tracing::error!("startup failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    std::fs::create_dir_all(config::data_dir())?;
    let uploads = UploadStore::open(config::uploads_dir())?;
    let conn = db::open_database(&config::db_path())?;
    let classifier = load_classifier()?;

    let core = Arc::new(AppState::new(conn, classifier, uploads));

    let mut server = start_server(core, config::listen_addr()).await?;
    tracing::info!(addr = %server.addr, "ready");

    tokio::signal::ctrl_c().await?;
    server.shutdown();
    Ok(())
}

#[cfg(feature = "onnx")]
fn load_classifier() -> Result<Arc<dyn OctClassifier>, StartupError> {
    let path = config::model_path();
    let classifier = inference::OnnxClassifier::load(&path, inference::ModelBinding::default())?;
    Ok(Arc::new(classifier))
}

#[cfg(not(feature = "onnx"))]
fn load_classifier() -> Result<Arc<dyn OctClassifier>, StartupError> {
    Err(StartupError::NoBackend)
}
