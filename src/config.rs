use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "DeepSight";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Side length of the square classifier input, in pixels.
pub const MODEL_INPUT_SIZE: u32 = 224;

/// Number of diagnostic classes the classifier distinguishes.
pub const CLASS_COUNT: usize = 2;

/// Upper bound on rows returned by the history query.
pub const HISTORY_LIMIT: usize = 500;

/// Get the application data directory.
/// ~/DeepSight/ by default (user-visible), overridable via DEEPSIGHT_DATA_DIR.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("DEEPSIGHT_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join("DeepSight")
}

/// Directory holding uploaded scans and derived heatmaps.
pub fn uploads_dir() -> PathBuf {
    data_dir().join("uploads")
}

/// Path of the SQLite database file.
pub fn db_path() -> PathBuf {
    data_dir().join("deepsight.db")
}

/// Path of the ONNX classifier artifact, overridable via DEEPSIGHT_MODEL.
pub fn model_path() -> PathBuf {
    if let Some(path) = std::env::var_os("DEEPSIGHT_MODEL") {
        return PathBuf::from(path);
    }
    data_dir().join("models").join("oct_densenet.onnx")
}

/// Listen address for the HTTP server, overridable via DEEPSIGHT_ADDR.
pub fn listen_addr() -> SocketAddr {
    std::env::var("DEEPSIGHT_ADDR")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8080)))
}

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    format!("info,{}=debug", env!("CARGO_PKG_NAME"))
}
