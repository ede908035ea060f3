//! Contracts for the external text detection and recognition models.
//!
//! The pipeline treats both networks as black boxes with a fixed
//! tensor-in/tensor-out contract. Resizing, normalization, region extraction
//! and decoding all happen in the adapters under [`crate::domain::adapters`].

use std::fmt::Debug;

use ndarray::{Array3, Array4, ArrayView2, ArrayView4};

use crate::core::OCRError;
use crate::processors::craft_postprocess::{CraftPostProcess, DetectionThresholds};
use crate::processors::geometry::Region;

/// A character-region text detector.
pub trait DetectionModel: Debug + Send + Sync {
    /// Name used in error messages and logs.
    fn name(&self) -> &str;

    /// Runs the detector.
    ///
    /// # Arguments
    ///
    /// * `batch` - Normalized images, `[N, 3, H, W]` with `H` and `W`
    ///   multiples of 32.
    ///
    /// # Returns
    ///
    /// Heatmaps of shape `[N, H / 2, W / 2, 2]`. Channel 0 holds the text
    /// score, channel 1 the link score.
    fn infer(&self, batch: ArrayView4<f32>) -> Result<Array4<f32>, OCRError>;

    /// Turns one image's heatmaps into regions in heatmap coordinates.
    ///
    /// The default implementation runs [`CraftPostProcess`] and always yields
    /// quadrilaterals; `polygon` is available to detectors that override it.
    fn extract_regions(
        &self,
        text: ArrayView2<f32>,
        link: ArrayView2<f32>,
        thresholds: &DetectionThresholds,
        _polygon: bool,
    ) -> Vec<Region> {
        CraftPostProcess::new().extract(&text, &link, thresholds)
    }
}

/// An attention-based text recognizer.
pub trait RecognitionModel: Debug + Send + Sync {
    /// Name used in error messages and logs.
    fn name(&self) -> &str;

    /// Runs the recognizer on a batch of crops, `[N, C, img_h, img_w]`.
    ///
    /// Returns one `[N, T, num_classes]` score tensor per prediction block.
    /// Models with a single head return a one-element vector.
    fn infer(&self, batch: ArrayView4<f32>) -> Result<Vec<Array3<f32>>, OCRError>;
}
