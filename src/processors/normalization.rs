//! Image normalization for model inputs.
//!
//! [`NormalizeImage`] applies `(pixel * scale - mean) / std` per channel and
//! writes the result into a channel-first tensor view. Two presets cover the
//! detector (ImageNet statistics on raw 0-255 pixels) and the recognizer
//! (values mapped to `[-1, 1]`).

use image::{GrayImage, RgbImage};
use ndarray::ArrayViewMut3;

use crate::core::OCRError;

/// ImageNet channel means in RGB order, for pixels scaled to `[0, 1]`.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet channel standard deviations in RGB order.
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Per-channel affine normalization.
///
/// Stored as `alpha = scale / std` and `beta = -mean / std` so each value is
/// a single multiply-add.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeImage {
    /// Scaling factor per channel.
    pub alpha: [f32; 3],
    /// Offset per channel.
    pub beta: [f32; 3],
}

impl NormalizeImage {
    /// Creates a normalizer.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `scale` or any `std` entry is not
    /// strictly positive.
    pub fn new(scale: f32, mean: [f32; 3], std: [f32; 3]) -> Result<Self, OCRError> {
        if scale <= 0.0 {
            return Err(OCRError::config_error("Scale must be greater than 0"));
        }
        for (i, &s) in std.iter().enumerate() {
            if s <= 0.0 {
                return Err(OCRError::config_error(format!(
                    "Standard deviation at index {i} must be greater than 0, got {s}"
                )));
            }
        }

        Ok(Self {
            alpha: std.map(|s| scale / s),
            beta: [0, 1, 2].map(|i| -mean[i] / std[i]),
        })
    }

    /// ImageNet statistics applied to raw pixel values.
    ///
    /// Equivalent to subtracting `mean * 255` and dividing by `std * 255`.
    pub fn imagenet() -> Self {
        Self {
            alpha: IMAGENET_STD.map(|s| 1.0 / (255.0 * s)),
            beta: [0, 1, 2].map(|i| -IMAGENET_MEAN[i] / IMAGENET_STD[i]),
        }
    }

    /// Maps pixel values from `[0, 255]` to `[-1, 1]` on every channel.
    pub fn unit_range() -> Self {
        Self {
            alpha: [2.0 / 255.0; 3],
            beta: [-1.0; 3],
        }
    }

    #[inline]
    fn apply(&self, channel: usize, value: u8) -> f32 {
        value as f32 * self.alpha[channel] + self.beta[channel]
    }

    /// Writes an RGB image into `out` with shape `[3, H', W']`.
    ///
    /// Only the `min(H, H') x min(W, W')` top-left area is written; the rest of
    /// `out` keeps its previous contents.
    pub fn write_rgb(&self, img: &RgbImage, mut out: ArrayViewMut3<f32>) {
        let (_, out_h, out_w) = out.dim();
        let (width, height) = img.dimensions();
        for y in 0..(height as usize).min(out_h) {
            for x in 0..(width as usize).min(out_w) {
                let pixel = img.get_pixel(x as u32, y as u32);
                for c in 0..3 {
                    out[[c, y, x]] = self.apply(c, pixel[c]);
                }
            }
        }
    }

    /// Writes a grayscale image into `out` with shape `[1, H', W']` using the
    /// first channel's statistics.
    pub fn write_gray(&self, img: &GrayImage, mut out: ArrayViewMut3<f32>) {
        let (_, out_h, out_w) = out.dim();
        let (width, height) = img.dimensions();
        for y in 0..(height as usize).min(out_h) {
            for x in 0..(width as usize).min(out_w) {
                out[[0, y, x]] = self.apply(0, img.get_pixel(x as u32, y as u32)[0]);
            }
        }
    }
}
