//! The classifier capability: probabilities plus the activation taps
//! the explainer needs, from a single forward pass.

use ndarray::{Array3, Array4};

use super::InferenceError;
use crate::config::CLASS_COUNT;

/// Result of one forward pass.
///
/// `features` and `gradients` are the last convolutional feature map and
/// the gradient of the predicted-class score with respect to it, both in
/// `[H, W, C]` layout. They come from the same pass that produced
/// `probabilities`, so the explainer never re-runs the model.
#[derive(Debug, Clone)]
pub struct Prediction {
    /// Class probabilities in canonical label order.
    pub probabilities: Vec<f32>,
    pub features: Array3<f32>,
    pub gradients: Array3<f32>,
}

impl Prediction {
    /// Index of the most probable class.
    pub fn argmax(&self) -> usize {
        self.probabilities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    pub fn max_probability(&self) -> f32 {
        self.probabilities
            .iter()
            .copied()
            .fold(0.0f32, f32::max)
    }
}

/// How a model artifact exposes its tensors. The tap names are a
/// property of the exported model, not of the explainer, so they live
/// here as configuration.
#[derive(Debug, Clone)]
pub struct ModelBinding {
    pub probabilities_output: String,
    pub features_output: String,
    pub gradients_output: String,
}

impl Default for ModelBinding {
    fn default() -> Self {
        Self {
            probabilities_output: "probabilities".into(),
            features_output: "conv_features".into(),
            gradients_output: "conv_gradients".into(),
        }
    }
}

/// A pretrained OCT classifier.
///
/// `input` is a `[1, H, W, 3]` normalized tensor from
/// [`super::preprocess::prepare_input`].
pub trait OctClassifier: Send + Sync {
    fn predict(&self, input: &Array4<f32>) -> Result<Prediction, InferenceError>;
}

// ═══════════════════════════════════════════════════════════
// ONNX Runtime backend, behind the `onnx` feature
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx")]
mod onnx {
    use std::path::Path;
    use std::sync::Mutex;

    use ndarray::{Array3, Array4};
    use ort::session::Session;

    use super::{ModelBinding, OctClassifier, Prediction};
    use crate::config::CLASS_COUNT;
    use crate::inference::InferenceError;

    /// Classifier backed by an ONNX model exported with three outputs:
    /// the class probabilities, the last convolutional feature map, and
    /// the feature-map gradients for the argmax class (the gradient
    /// subgraph is baked into the artifact at export time).
    ///
    /// Uses interior mutability (Mutex) because `ort::Session::run`
    /// requires `&mut self` while the trait exposes `&self` for shared use.
    pub struct OnnxClassifier {
        session: Mutex<Session>,
        binding: ModelBinding,
    }

    impl OnnxClassifier {
        pub fn load(model_path: &Path, binding: ModelBinding) -> Result<Self, InferenceError> {
            if !model_path.exists() {
                return Err(InferenceError::ModelNotFound(model_path.to_path_buf()));
            }

            let session = Session::builder()
                .map_err(|e: ort::Error| InferenceError::ModelInit(e.to_string()))?
                .with_intra_threads(2)
                .map_err(|e: ort::Error| InferenceError::ModelInit(e.to_string()))?
                .commit_from_file(model_path)
                .map_err(|e: ort::Error| {
                    InferenceError::ModelInit(format!("ONNX load failed: {e}"))
                })?;

            tracing::info!("classifier loaded from {}", model_path.display());

            Ok(Self {
                session: Mutex::new(session),
                binding,
            })
        }
    }

    impl OctClassifier for OnnxClassifier {
        fn predict(&self, input: &Array4<f32>) -> Result<Prediction, InferenceError> {
            use ort::value::TensorRef;

            let input_tensor = TensorRef::from_array_view(input)
                .map_err(|e| InferenceError::Inference(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| InferenceError::Inference("session lock poisoned".into()))?;

            let outputs = session
                .run(ort::inputs![input_tensor])
                .map_err(|e| InferenceError::Inference(format!("ONNX inference failed: {e}")))?;

            let probabilities = extract_vector(
                &outputs[self.binding.probabilities_output.as_str()],
                &self.binding.probabilities_output,
            )?;
            if probabilities.len() != CLASS_COUNT {
                return Err(InferenceError::ModelOutput(format!(
                    "expected {CLASS_COUNT} class probabilities, got {}",
                    probabilities.len()
                )));
            }

            let features = extract_feature_map(
                &outputs[self.binding.features_output.as_str()],
                &self.binding.features_output,
            )?;
            let gradients = extract_feature_map(
                &outputs[self.binding.gradients_output.as_str()],
                &self.binding.gradients_output,
            )?;
            if features.dim() != gradients.dim() {
                return Err(InferenceError::ModelOutput(format!(
                    "feature map {:?} and gradient map {:?} disagree",
                    features.dim(),
                    gradients.dim()
                )));
            }

            Ok(Prediction {
                probabilities,
                features,
                gradients,
            })
        }
    }

    /// Extract a `[1, N]` (or flat `[N]`) float output as a vector.
    fn extract_vector(
        value: &ort::value::DynValue,
        name: &str,
    ) -> Result<Vec<f32>, InferenceError> {
        let (_, data) = value
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::ModelOutput(format!("{name}: {e}")))?;
        Ok(data.to_vec())
    }

    /// Extract a `[1, H, W, C]` float output as an `[H, W, C]` array.
    fn extract_feature_map(
        value: &ort::value::DynValue,
        name: &str,
    ) -> Result<Array3<f32>, InferenceError> {
        let (shape, data) = value
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::ModelOutput(format!("{name}: {e}")))?;

        if shape.len() != 4 || shape[0] != 1 {
            return Err(InferenceError::ModelOutput(format!(
                "{name}: expected [1, H, W, C], got {shape:?}"
            )));
        }

        let (h, w, c) = (shape[1] as usize, shape[2] as usize, shape[3] as usize);
        Array3::from_shape_vec((h, w, c), data.to_vec())
            .map_err(|e| InferenceError::ModelOutput(format!("{name}: {e}")))
    }
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;

// ═══════════════════════════════════════════════════════════
// Mock backend (testing)
// ═══════════════════════════════════════════════════════════

/// Deterministic classifier for tests: fixed probabilities and a
/// synthetic activation pattern concentrated in the top-left quadrant.
pub struct MockClassifier {
    probabilities: Vec<f32>,
    map_side: usize,
    channels: usize,
}

impl MockClassifier {
    pub fn with_probabilities(probabilities: Vec<f32>) -> Self {
        Self {
            probabilities,
            map_side: 7,
            channels: 4,
        }
    }

    /// Confidently normal scan.
    pub fn normal() -> Self {
        Self::with_probabilities(vec![0.92, 0.08])
    }

    /// Confidently pathological scan.
    pub fn dme() -> Self {
        Self::with_probabilities(vec![0.08, 0.92])
    }

    /// Produces empty activation taps so the explainer fails while the
    /// textual prediction still succeeds. Exercises the soft-fail path.
    pub fn degenerate() -> Self {
        Self {
            probabilities: vec![0.6, 0.4],
            map_side: 0,
            channels: 0,
        }
    }
}

impl OctClassifier for MockClassifier {
    fn predict(&self, _input: &Array4<f32>) -> Result<Prediction, InferenceError> {
        if self.probabilities.len() != CLASS_COUNT {
            return Err(InferenceError::ModelOutput(format!(
                "mock configured with {} probabilities",
                self.probabilities.len()
            )));
        }

        let side = self.map_side;
        let features = Array3::from_shape_fn((side, side, self.channels), |(h, w, _)| {
            if h < side / 2 && w < side / 2 {
                1.0
            } else {
                0.1
            }
        });
        let gradients = Array3::from_elem((side, side, self.channels), 1.0);

        Ok(Prediction {
            probabilities: self.probabilities.clone(),
            features,
            gradients,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_input() -> Array4<f32> {
        Array4::zeros((1, 224, 224, 3))
    }

    #[test]
    fn argmax_picks_largest_probability() {
        let prediction = MockClassifier::dme().predict(&dummy_input()).unwrap();
        assert_eq!(prediction.argmax(), 1);
        assert!((prediction.max_probability() - 0.92).abs() < 1e-6);
    }

    #[test]
    fn mock_maps_share_shape() {
        let prediction = MockClassifier::normal().predict(&dummy_input()).unwrap();
        assert_eq!(prediction.features.dim(), prediction.gradients.dim());
        assert_eq!(prediction.features.dim(), (7, 7, 4));
    }

    #[test]
    fn degenerate_mock_has_empty_maps() {
        let prediction = MockClassifier::degenerate().predict(&dummy_input()).unwrap();
        assert_eq!(prediction.features.len(), 0);
        assert_eq!(prediction.probabilities.len(), 2);
    }

    #[test]
    fn misconfigured_mock_rejected() {
        let broken = MockClassifier::with_probabilities(vec![1.0]);
        assert!(broken.predict(&dummy_input()).is_err());
    }

    #[cfg(feature = "onnx")]
    #[test]
    fn missing_model_file_reported() {
        let result = OnnxClassifier::load(
            std::path::Path::new("/nonexistent/model.onnx"),
            ModelBinding::default(),
        );
        assert!(matches!(result, Err(InferenceError::ModelNotFound(_))));
    }
}
