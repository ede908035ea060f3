//! Error types for the OCR pipeline.
//!
//! This module groups the crate-wide [`OCRError`] enum, the [`ProcessingStage`]
//! marker used to tag processing failures, and helper constructors that attach
//! consistent context to errors raised by detection, cropping, segmentation and
//! recognition.
//!
//! # Usage
//!
//! ```rust
//! use heatmap_ocr::core::errors::{OCRError, ProcessingStage};
//!
//! let error = OCRError::region_extraction("12-4_80-20", "quadrilateral has zero height");
//! assert!(matches!(error, OCRError::RegionExtraction { .. }));
//!
//! let config_error = OCRError::config_error("canvas_size must be positive");
//! assert!(config_error.to_string().contains("canvas_size"));
//! ```

pub mod constructors;
pub mod types;

pub use types::{ImageProcessError, OCRError, ProcessingStage};

/// Convenient result alias for OCR operations.
pub type OcrResult<T> = Result<T, OCRError>;
