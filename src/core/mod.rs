//! The core module of the OCR pipeline.
//!
//! This module contains the fundamental pieces shared by every stage:
//! - Configuration validation
//! - Error handling
//! - Traits describing the external detector and recognizer models

pub mod config;
pub mod errors;
pub mod traits;

pub use config::{ConfigError, ConfigValidator};
pub use errors::{ImageProcessError, OCRError, OcrResult, ProcessingStage};
pub use traits::{DetectionModel, RecognitionModel};
