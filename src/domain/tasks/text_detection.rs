//! Text detection configuration and output types.
//!
//! The detector locates text regions and also exposes its text score map,
//! which the pipeline reuses for line and word segmentation.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::impl_config_validator;
use crate::processors::craft_postprocess::DetectionThresholds;
use crate::processors::geometry::Region;
use crate::processors::segmentation::ScoreMap;
use crate::utils::dilate_channels;

/// Optional image transform applied before detection only.
///
/// Crops for recognition are always taken from the untouched image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetectionTransform {
    /// Per-channel grayscale dilation with a square kernel.
    Dilation { kernel_size: u32 },
}

impl DetectionTransform {
    /// Applies the transform to `image`.
    pub fn apply(&self, image: &RgbImage) -> RgbImage {
        match *self {
            DetectionTransform::Dilation { kernel_size } => dilate_channels(image, kernel_size),
        }
    }
}

/// Configuration for text detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextDetectionConfig {
    /// Upper bound for the long side of the detector input (default: 1280)
    pub canvas_size: u32,
    /// Magnification applied before the canvas bound (default: 1.5)
    pub mag_ratio: f32,
    /// Minimum peak text score of a kept region (default: 0.7)
    pub text_threshold: f32,
    /// Link score binarization threshold (default: 0.4)
    pub link_threshold: f32,
    /// Text score binarization threshold (default: 0.4)
    pub low_text: f32,
    /// Ask the detector for polygon output where it supports it (default: false)
    pub polygon: bool,
    /// Grow components before fitting their rectangles (default: true)
    pub expand_components: bool,
    /// Transform applied to the image before detection (default: none)
    pub transform: Option<DetectionTransform>,
}

impl Default for TextDetectionConfig {
    fn default() -> Self {
        Self {
            canvas_size: 1280,
            mag_ratio: 1.5,
            text_threshold: 0.7,
            link_threshold: 0.4,
            low_text: 0.4,
            polygon: false,
            expand_components: true,
            transform: None,
        }
    }
}

impl TextDetectionConfig {
    /// Thresholds forwarded to region extraction.
    pub fn thresholds(&self) -> DetectionThresholds {
        DetectionThresholds {
            text_threshold: self.text_threshold,
            link_threshold: self.link_threshold,
            low_text: self.low_text,
            expand_components: self.expand_components,
        }
    }
}

impl_config_validator!(TextDetectionConfig {
    canvas_size: min(32),
    mag_ratio: min(0.1),
    text_threshold: range(0.0, 1.0),
    link_threshold: range(0.0, 1.0),
    low_text: range(0.0, 1.0),
});

/// Detection result for one image.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Regions in original image coordinates, in extraction order.
    pub regions: Vec<Region>,
    /// Text score map covering the resized image.
    pub score_map: ScoreMap,
    /// Resized size divided by original size.
    pub scale_ratio: f32,
}

impl Detection {
    /// Whether no region was found.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
