//! # heatmap-ocr
//!
//! Optical character recognition built from two pluggable models, a
//! character-region text detector and an attention text recognizer, plus the
//! glue that makes the pair usable on real documents:
//!
//! - heatmap-driven line and word segmentation of the detector score map,
//! - perspective rectification of skewed text regions,
//! - voting across the recognizer's parallel prediction blocks,
//! - a confidence-gated second pass that re-reads weak regions slice by slice.
//!
//! The models themselves are supplied by the caller through the
//! [`DetectionModel`](core::DetectionModel) and
//! [`RecognitionModel`](core::RecognitionModel) traits.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use heatmap_ocr::prelude::*;
//! use heatmap_ocr::utils::load_image;
//!
//! # fn run(
//! #     detector: Arc<dyn DetectionModel>,
//! #     recognizer: Arc<dyn RecognitionModel>,
//! # ) -> Result<(), OCRError> {
//! let config = OcrConfig::from_json_file("ocr.json")?;
//! let ctx = OcrContext::from_models(detector, recognizer, &config)?;
//! let pipeline = OcrPipeline::new(config)?;
//!
//! let page = load_image(Path::new("page.png"))?;
//! let records = pipeline.ocr_image(&ctx, &page)?;
//! let records = pipeline.refine(&ctx, &page, records)?;
//! for record in &records {
//!     println!("{} ({:.2})", record.text, record.confidence);
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod pipeline;
pub mod processors;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

/// Commonly used types.
pub mod prelude {
    pub use crate::core::{DetectionModel, OCRError, OcrResult, RecognitionModel};
    pub use crate::domain::{TextDetectionConfig, TextRecognitionConfig};
    pub use crate::pipeline::{
        BoxRepresentation, Geometry, ImageSource, NoAcceptPolicy, OcrConfig, OcrContext,
        OcrPipeline, OutputRecord, SplitOcrOutput,
    };
    pub use crate::processors::{CutLineSet, Region, ScoreMap, SegmentAxis};
    pub use crate::utils::init_tracing;
}
