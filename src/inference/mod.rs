pub mod classifier;
pub mod explain;
pub mod pipeline;
pub mod preprocess;

#[cfg(feature = "onnx")]
pub use classifier::OnnxClassifier;
pub use classifier::{MockClassifier, ModelBinding, OctClassifier, Prediction};
pub use pipeline::{run_diagnosis, DiagnosisRequest, PipelineError};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Invalid input image: {0}")]
    InvalidInput(String),

    #[error("Model file not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Model initialization failed: {0}")]
    ModelInit(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Unexpected model output: {0}")]
    ModelOutput(String),

    #[error("Image encoding failed: {0}")]
    Encoding(String),
}
