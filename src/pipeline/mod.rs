//! End-to-end OCR pipeline.
//!
//! [`OcrPipeline`] runs detection and recognition on whole images or on tiles
//! cut along the detector score map, and [`refine`] re-reads low-confidence
//! records. Models are shared through an [`OcrContext`].

pub mod config;
pub mod context;
pub mod ocr;
pub mod refine;
pub mod result;

pub use config::{BoxRepresentation, NoAcceptPolicy, OcrConfig, RefineConfig, SplitConfig};
pub use context::OcrContext;
pub use ocr::{ImageSource, OcrPipeline, SplitOcrOutput, SplitTile};
pub use refine::{RefineParams, refine};
pub use result::{Geometry, OutputRecord};
