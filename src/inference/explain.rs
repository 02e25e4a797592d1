//! Activation overlay for one prediction.
//!
//! From the feature map and gradients of a single forward pass:
//! pool the gradients per channel, weight the feature-map channels,
//! clip and normalize, upsample to the scan's resolution, color with a
//! hot scale, and blend onto the original. Normal results get their red
//! channel attenuated so a negative finding never reads as pathology.

use image::RgbImage;
use ndarray::{Array2, Array3};

use super::classifier::Prediction;
use super::InferenceError;
use crate::models::ClassLabel;

/// Blend weights: original scan vs. color overlay.
const BLEND_ORIGINAL: f32 = 0.6;
const BLEND_OVERLAY: f32 = 0.4;

/// Red channel survives at this fraction for Normal results.
const NORMAL_RED_FACTOR: f32 = 0.15;

/// Render the full overlay for a prediction onto the original scan.
pub fn render_overlay(
    prediction: &Prediction,
    label: ClassLabel,
    original: &RgbImage,
) -> Result<RgbImage, InferenceError> {
    let (h, w, c) = prediction.features.dim();
    if h == 0 || w == 0 || c == 0 {
        return Err(InferenceError::ModelOutput(
            "empty feature map, cannot build overlay".into(),
        ));
    }
    if prediction.features.dim() != prediction.gradients.dim() {
        return Err(InferenceError::ModelOutput(
            "feature and gradient maps disagree in shape".into(),
        ));
    }

    let weights = channel_weights(&prediction.gradients);
    let map = importance_map(&prediction.features, &weights);
    let resized = resize_bilinear(&map, original.width(), original.height());
    let colored = colorize(&resized, label);
    Ok(blend_overlay(original, &colored))
}

/// One importance weight per feature channel: the spatial mean of the
/// gradient for that channel.
pub fn channel_weights(gradients: &Array3<f32>) -> Vec<f32> {
    let (h, w, c) = gradients.dim();
    let area = (h * w) as f32;
    let mut weights = vec![0.0f32; c];
    for ((_, _, ch), value) in gradients.indexed_iter() {
        weights[ch] += value;
    }
    for weight in &mut weights {
        *weight /= area;
    }
    weights
}

/// Single-channel importance map: per-pixel weighted sum of the feature
/// channels, negatives clipped, then scaled into [0, 1] by the maximum.
/// An all-zero map is left untouched rather than divided by zero.
pub fn importance_map(features: &Array3<f32>, weights: &[f32]) -> Array2<f32> {
    let (h, w, _) = features.dim();
    let mut map = Array2::<f32>::zeros((h, w));

    for ((y, x, c), value) in features.indexed_iter() {
        map[[y, x]] += value * weights[c];
    }

    map.mapv_inplace(|v| v.max(0.0));

    let max = map.iter().copied().fold(0.0f32, f32::max);
    if max > 0.0 {
        map.mapv_inplace(|v| v / max);
    }
    map
}

/// Upsample an importance map to pixel dimensions with bilinear
/// interpolation.
pub fn resize_bilinear(map: &Array2<f32>, width: u32, height: u32) -> Array2<f32> {
    let (src_h, src_w) = map.dim();
    let (dst_h, dst_w) = (height as usize, width as usize);
    let mut out = Array2::<f32>::zeros((dst_h, dst_w));

    if src_h == 0 || src_w == 0 || dst_h == 0 || dst_w == 0 {
        return out;
    }

    let scale_y = src_h as f32 / dst_h as f32;
    let scale_x = src_w as f32 / dst_w as f32;

    for y in 0..dst_h {
        let sy = ((y as f32 + 0.5) * scale_y - 0.5).clamp(0.0, (src_h - 1) as f32);
        let y0 = sy.floor() as usize;
        let y1 = (y0 + 1).min(src_h - 1);
        let fy = sy - y0 as f32;

        for x in 0..dst_w {
            let sx = ((x as f32 + 0.5) * scale_x - 0.5).clamp(0.0, (src_w - 1) as f32);
            let x0 = sx.floor() as usize;
            let x1 = (x0 + 1).min(src_w - 1);
            let fx = sx - x0 as f32;

            let top = map[[y0, x0]] * (1.0 - fx) + map[[y0, x1]] * fx;
            let bottom = map[[y1, x0]] * (1.0 - fx) + map[[y1, x1]] * fx;
            out[[y, x]] = top * (1.0 - fy) + bottom * fy;
        }
    }
    out
}

/// Hot color scale: black through red and yellow to white.
/// Input is clamped to [0, 1].
pub fn hot_rgb(value: f32) -> [u8; 3] {
    let v = value.clamp(0.0, 1.0);
    let r = (3.0 * v).clamp(0.0, 1.0);
    let g = (3.0 * v - 1.0).clamp(0.0, 1.0);
    let b = (3.0 * v - 2.0).clamp(0.0, 1.0);
    [
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    ]
}

/// Color an importance map, attenuating the red channel for Normal
/// results before any blending.
pub fn colorize(map: &Array2<f32>, label: ClassLabel) -> RgbImage {
    let (h, w) = map.dim();
    let mut img = RgbImage::new(w as u32, h as u32);

    for ((y, x), value) in map.indexed_iter() {
        let mut rgb = hot_rgb(*value);
        if label == ClassLabel::Normal {
            rgb[0] = (rgb[0] as f32 * NORMAL_RED_FACTOR) as u8;
        }
        img.put_pixel(x as u32, y as u32, image::Rgb(rgb));
    }
    img
}

/// Weighted blend of the original scan and the color overlay.
/// Both images must share dimensions.
pub fn blend_overlay(original: &RgbImage, overlay: &RgbImage) -> RgbImage {
    let (w, h) = (original.width(), original.height());
    let mut out = RgbImage::new(w, h);

    for y in 0..h {
        for x in 0..w {
            let a = original.get_pixel(x, y).0;
            let b = overlay.get_pixel(x, y).0;
            let mut blended = [0u8; 3];
            for c in 0..3 {
                let value = a[c] as f32 * BLEND_ORIGINAL + b[c] as f32 * BLEND_OVERLAY;
                blended[c] = value.round().clamp(0.0, 255.0) as u8;
            }
            out.put_pixel(x, y, image::Rgb(blended));
        }
    }
    out
}
