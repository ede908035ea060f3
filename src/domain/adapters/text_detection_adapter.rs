//! Text Detection Adapter
//!
//! This adapter prepares images for a character-region detector, runs it and
//! maps its heatmaps back into image-space regions and a reusable score map.

use std::borrow::Cow;
use std::sync::Arc;

use image::RgbImage;
use ndarray::{Array4, Axis, s};
use tracing::debug;

use crate::core::config::ConfigValidator;
use crate::core::{DetectionModel, OCRError};
use crate::domain::tasks::{Detection, TextDetectionConfig};
use crate::processors::normalization::NormalizeImage;
use crate::processors::resize::{CanvasResize, ResizedImage};
use crate::processors::segmentation::ScoreMap;

/// Heatmaps are produced at half the input resolution.
const HEATMAP_STRIDE: f32 = 2.0;

/// Text detection adapter around a [`DetectionModel`].
#[derive(Debug, Clone)]
pub struct TextDetectionAdapter {
    /// The underlying detector
    model: Arc<dyn DetectionModel>,
    /// Task configuration
    config: TextDetectionConfig,
    resizer: CanvasResize,
    normalizer: NormalizeImage,
}

impl TextDetectionAdapter {
    /// Creates a builder.
    pub fn builder() -> TextDetectionAdapterBuilder {
        TextDetectionAdapterBuilder::new()
    }

    /// The configuration in effect.
    pub fn config(&self) -> &TextDetectionConfig {
        &self.config
    }

    /// Detects text in a single image.
    ///
    /// Finding no region is not an error.
    pub fn detect(&self, image: &RgbImage) -> Result<Detection, OCRError> {
        self.detect_batch(std::slice::from_ref(image))?
            .pop()
            .ok_or_else(|| OCRError::detection_error("detector returned no output for the image"))
    }

    /// Detects text in several images with a single detector call.
    ///
    /// Every image is resized independently; all of them are then padded to
    /// one common canvas. Each result carries its own image's scale ratio.
    ///
    /// # Errors
    ///
    /// Fails when an image is empty, when the detector fails, or when its
    /// output does not match the `[N, H/2, W/2, 2]` contract.
    pub fn detect_batch(&self, images: &[RgbImage]) -> Result<Vec<Detection>, OCRError> {
        if images.is_empty() {
            return Ok(Vec::new());
        }

        let resized = images
            .iter()
            .map(|image| {
                let source = match &self.config.transform {
                    Some(transform) => Cow::Owned(transform.apply(image)),
                    None => Cow::Borrowed(image),
                };
                self.resizer.apply(&source)
            })
            .collect::<Result<Vec<ResizedImage>, OCRError>>()?;

        let batch = self.build_batch(&resized);
        let (_, _, canvas_h, canvas_w) = batch.dim();
        debug!(
            model = self.model.name(),
            images = images.len(),
            canvas_w,
            canvas_h,
            "running text detector"
        );

        let heatmaps = self.model.infer(batch.view())?;
        let shape = heatmaps.shape();
        if shape[0] != images.len() || shape[3] < 2 {
            return Err(OCRError::shape_mismatch(
                format!("detector '{}' output", self.model.name()),
                &[images.len(), canvas_h / 2, canvas_w / 2, 2],
                shape,
            ));
        }
        let (map_h, map_w) = (shape[1], shape[2]);

        let thresholds = self.config.thresholds();
        let detections = resized
            .iter()
            .enumerate()
            .map(|(i, r)| {
                // Only the part of the heatmap covering this image's content
                let rows = (r.image.height() as usize).div_ceil(2).min(map_h);
                let cols = (r.image.width() as usize).div_ceil(2).min(map_w);
                let text = heatmaps.slice(s![i, ..rows, ..cols, 0]);
                let link = heatmaps.slice(s![i, ..rows, ..cols, 1]);

                let scale = HEATMAP_STRIDE / r.ratio;
                let regions: Vec<_> = self
                    .model
                    .extract_regions(text, link, &thresholds, self.config.polygon)
                    .into_iter()
                    .map(|region| region.scaled(scale))
                    .collect();

                debug!(
                    image = i,
                    regions = regions.len(),
                    ratio = r.ratio,
                    "text regions extracted"
                );
                Detection {
                    regions,
                    score_map: ScoreMap::new(text.to_owned(), scale),
                    scale_ratio: r.ratio,
                }
            })
            .collect();

        Ok(detections)
    }

    /// Normalizes resized images into a zero-padded `[N, 3, H, W]` tensor.
    fn build_batch(&self, resized: &[ResizedImage]) -> Array4<f32> {
        let canvas_h = resized.iter().map(|r| r.padded_height).max().unwrap_or(0) as usize;
        let canvas_w = resized.iter().map(|r| r.padded_width).max().unwrap_or(0) as usize;

        let mut batch = Array4::<f32>::zeros((resized.len(), 3, canvas_h, canvas_w));
        for (r, slot) in resized.iter().zip(batch.axis_iter_mut(Axis(0))) {
            self.normalizer.write_rgb(&r.image, slot);
        }
        batch
    }
}

/// Builder for [`TextDetectionAdapter`].
#[derive(Debug, Default)]
pub struct TextDetectionAdapterBuilder {
    config: TextDetectionConfig,
}

impl TextDetectionAdapterBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the task configuration.
    pub fn with_config(mut self, config: TextDetectionConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the canvas bound.
    pub fn canvas_size(mut self, canvas_size: u32) -> Self {
        self.config.canvas_size = canvas_size;
        self
    }

    /// Sets the magnification ratio.
    pub fn mag_ratio(mut self, mag_ratio: f32) -> Self {
        self.config.mag_ratio = mag_ratio;
        self
    }

    /// Enables or disables component expansion.
    pub fn expand_components(mut self, expand: bool) -> Self {
        self.config.expand_components = expand;
        self
    }

    /// Validates the configuration and builds the adapter.
    pub fn build(self, model: Arc<dyn DetectionModel>) -> Result<TextDetectionAdapter, OCRError> {
        self.config.validate()?;

        Ok(TextDetectionAdapter {
            model,
            resizer: CanvasResize::new(self.config.canvas_size, self.config.mag_ratio),
            normalizer: NormalizeImage::imagenet(),
            config: self.config,
        })
    }
}
