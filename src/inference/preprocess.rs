//! Turns an uploaded scan into the classifier's input tensor.
//!
//! The classifier family was trained on 224x224 RGB crops resized
//! without aspect-ratio preservation and normalized with the standard
//! ImageNet statistics (scale to [0,1], per-channel mean/std). The
//! tensor layout is NHWC, matching the exported model.

use image::imageops::FilterType;
use image::RgbImage;
use ndarray::Array4;

use super::InferenceError;

/// Per-channel mean of the training distribution (RGB, [0,1] scale).
const CHANNEL_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Per-channel standard deviation of the training distribution.
const CHANNEL_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Decode uploaded bytes into an RGB image.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, InferenceError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| InferenceError::InvalidInput(format!("failed to decode image: {e}")))?;
    Ok(img.to_rgb8())
}

/// Build a `[1, target, target, 3]` input tensor from uploaded bytes.
///
/// The image is stretched to the target square directly; the network
/// expects the same distortion it saw in training.
pub fn prepare_input(bytes: &[u8], target: u32) -> Result<Array4<f32>, InferenceError> {
    let rgb = decode_rgb(bytes)?;
    let resized = image::imageops::resize(&rgb, target, target, FilterType::CatmullRom);

    let side = target as usize;
    let mut tensor = Array4::<f32>::zeros((1, side, side, 3));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            let value = pixel.0[c] as f32 / 255.0;
            tensor[[0, y as usize, x as usize, c]] = (value - CHANNEL_MEAN[c]) / CHANNEL_STD[c];
        }
    }
    Ok(tensor)
}
