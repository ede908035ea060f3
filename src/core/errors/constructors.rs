//! Error constructor utilities for the OCR pipeline.
//!
//! Helper functions for building [`OCRError`] values with consistent context,
//! so call sites stay short and messages stay uniform.

use super::types::{OCRError, ProcessingStage};

impl OCRError {
    /// Creates a processing error for the given stage.
    pub fn processing_error(
        kind: ProcessingStage,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Creates a tensor operation error.
    pub fn tensor_operation(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::processing_error(ProcessingStage::TensorOperation, context, source)
    }

    /// Wraps an error returned by an external model.
    pub fn inference_error(
        model_name: impl Into<String>,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference {
            model_name: model_name.into(),
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Creates a detection error for unusable detector output.
    pub fn detection_error(context: impl Into<String>) -> Self {
        Self::Detection {
            context: context.into(),
        }
    }

    /// Creates a per-region extraction error.
    pub fn region_extraction(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RegionExtraction {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Creates a configuration error for invalid field values.
    ///
    /// # Arguments
    ///
    /// * `field` - The name of the field with an invalid value
    /// * `expected` - Description of what was expected
    /// * `actual` - Description of what was actually provided
    pub fn invalid_field(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::ConfigError {
            message: format!(
                "invalid value for field '{}': expected {}, got {}",
                field.into(),
                expected.into(),
                actual.into()
            ),
        }
    }

    /// Creates an error reporting a tensor with an unexpected shape.
    pub fn shape_mismatch(
        context: impl Into<String>,
        expected: &[usize],
        actual: &[usize],
    ) -> Self {
        Self::InvalidInput {
            message: format!(
                "{}: expected shape {:?}, got {:?}",
                context.into(),
                expected,
                actual
            ),
        }
    }

    /// Returns true when the error only concerns a single region or tile and
    /// can be recovered by skipping that unit.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            OCRError::RegionExtraction { .. }
                | OCRError::Processing {
                    kind: ProcessingStage::Cropping,
                    ..
                }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_field_message() {
        let err = OCRError::invalid_field("canvas_size", "> 0", "0");
        assert_eq!(
            err.to_string(),
            "configuration: invalid value for field 'canvas_size': expected > 0, got 0"
        );
    }

    #[test]
    fn test_is_local_only_for_region_scoped_errors() {
        assert!(OCRError::region_extraction("k", "r").is_local());
        assert!(!OCRError::detection_error("empty heatmap").is_local());
        assert!(
            !OCRError::inference_error("craft", "forward", std::io::Error::other("x")).is_local()
        );
    }

    #[test]
    fn test_shape_mismatch_lists_shapes() {
        let err = OCRError::shape_mismatch("heatmap", &[1, 2, 3, 2], &[1, 2, 3]);
        assert!(err.to_string().contains("[1, 2, 3, 2]"));
    }
}
