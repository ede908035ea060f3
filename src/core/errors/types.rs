//! Core error types for the OCR pipeline.
//!
//! This module defines the fundamental error types used throughout the crate,
//! including the main OCRError enum and the ProcessingStage marker.

use thiserror::Error;

/// Errors that can occur during low-level image geometry operations.
#[derive(Debug, Error)]
pub enum ImageProcessError {
    /// The crop size is invalid (e.g., zero dimensions).
    #[error("Invalid crop size")]
    InvalidCropSize,
    /// The crop coordinates are out of bounds.
    #[error("Crop coordinates are out of bounds")]
    CropOutOfBounds,
    /// The crop coordinates are invalid.
    #[error("Invalid crop coordinates")]
    InvalidCropCoordinates,
    /// The perspective transform could not be solved or inverted.
    #[error("Degenerate perspective transform")]
    DegenerateTransform,
}

/// Enum representing different stages of processing in the OCR pipeline.
///
/// Used to identify which stage of the pipeline an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Error occurred during tensor operations.
    TensorOperation,
    /// Error occurred during image normalization.
    Normalization,
    /// Error occurred during canvas resizing.
    Resize,
    /// Error occurred while preparing or post-processing detection output.
    Detection,
    /// Error occurred while cropping or rectifying a region.
    Cropping,
    /// Error occurred while segmenting a score map.
    Segmentation,
    /// Error occurred while encoding or decoding recognition batches.
    Recognition,
    /// Error occurred during the recursive refinement pass.
    Refinement,
    /// Error occurred during pipeline execution.
    PipelineExecution,
    /// Generic processing error.
    Generic,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::TensorOperation => write!(f, "tensor operation"),
            ProcessingStage::Normalization => write!(f, "normalization"),
            ProcessingStage::Resize => write!(f, "resize"),
            ProcessingStage::Detection => write!(f, "detection"),
            ProcessingStage::Cropping => write!(f, "cropping"),
            ProcessingStage::Segmentation => write!(f, "segmentation"),
            ProcessingStage::Recognition => write!(f, "recognition"),
            ProcessingStage::Refinement => write!(f, "refinement"),
            ProcessingStage::PipelineExecution => write!(f, "pipeline execution"),
            ProcessingStage::Generic => write!(f, "processing"),
        }
    }
}

/// Enum representing the errors that can occur in the OCR pipeline.
///
/// Whole-pipeline failures (the detector or recognizer call itself) surface as
/// [`OCRError::Inference`] or [`OCRError::Detection`] and are propagated to the
/// caller. [`OCRError::RegionExtraction`] is produced per region and is expected
/// to be recovered locally by skipping that region.
#[derive(Error, Debug)]
pub enum OCRError {
    /// Error occurred while loading an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// Error occurred during processing.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage of processing where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An external model call failed.
    #[error("inference failed in model '{model_name}': {context}")]
    Inference {
        /// The name of the model where inference failed.
        model_name: String,
        /// Additional context about the inference error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The detector produced output that cannot be used.
    #[error("detection failed: {context}")]
    Detection {
        /// What was wrong with the detector output.
        context: String,
    },

    /// A single region could not be cropped or rectified.
    #[error("region '{key}' could not be extracted: {reason}")]
    RegionExtraction {
        /// Key of the region that failed.
        key: String,
        /// Why extraction failed.
        reason: String,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// Error from basic tensor operations.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),

    /// Error parsing a JSON configuration.
    #[error("json")]
    Json(#[from] serde_json::Error),
}

impl From<image::ImageError> for OCRError {
    /// Converts an image::ImageError to OCRError::ImageLoad.
    fn from(error: image::ImageError) -> Self {
        Self::ImageLoad(error)
    }
}

impl From<crate::core::config::ConfigError> for OCRError {
    /// Converts a ConfigError to OCRError::ConfigError.
    fn from(error: crate::core::config::ConfigError) -> Self {
        Self::ConfigError {
            message: error.to_string(),
        }
    }
}

impl From<ImageProcessError> for OCRError {
    /// Converts an ImageProcessError to OCRError::Processing.
    fn from(error: ImageProcessError) -> Self {
        Self::Processing {
            kind: ProcessingStage::Cropping,
            context: "Image processing failed".to_string(),
            source: Box::new(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_stage_display() {
        assert_eq!(ProcessingStage::Segmentation.to_string(), "segmentation");
        assert_eq!(ProcessingStage::Refinement.to_string(), "refinement");
    }

    #[test]
    fn test_image_process_error_converts_to_cropping_stage() {
        let err: OCRError = ImageProcessError::DegenerateTransform.into();
        match err {
            OCRError::Processing { kind, .. } => assert_eq!(kind, ProcessingStage::Cropping),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_region_extraction_message_names_key() {
        let err = OCRError::RegionExtraction {
            key: "1-2_3-4".to_string(),
            reason: "empty".to_string(),
        };
        assert!(err.to_string().contains("1-2_3-4"));
    }
}
