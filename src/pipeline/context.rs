//! Shared model handles passed to every pipeline call.

use std::sync::Arc;

use crate::core::{DetectionModel, OCRError, RecognitionModel};
use crate::domain::adapters::{TextDetectionAdapter, TextRecognitionAdapter};
use crate::pipeline::config::OcrConfig;

/// The loaded detector and recognizer.
///
/// Cloning is cheap; both adapters are reference counted.
#[derive(Debug, Clone)]
pub struct OcrContext {
    detector: Arc<TextDetectionAdapter>,
    recognizer: Arc<TextRecognitionAdapter>,
}

impl OcrContext {
    /// Creates a context from ready adapters.
    pub fn new(detector: TextDetectionAdapter, recognizer: TextRecognitionAdapter) -> Self {
        Self {
            detector: Arc::new(detector),
            recognizer: Arc::new(recognizer),
        }
    }

    /// Wraps raw models in adapters configured from `config`.
    ///
    /// # Errors
    ///
    /// Fails when the detector or recognizer configuration is invalid.
    pub fn from_models(
        detection_model: Arc<dyn DetectionModel>,
        recognition_model: Arc<dyn RecognitionModel>,
        config: &OcrConfig,
    ) -> Result<Self, OCRError> {
        let detector = TextDetectionAdapter::builder()
            .with_config(config.detector.clone())
            .build(detection_model)?;
        let recognizer = TextRecognitionAdapter::builder()
            .with_config(config.recognizer.clone())
            .build(recognition_model)?;
        Ok(Self::new(detector, recognizer))
    }

    pub fn detector(&self) -> &TextDetectionAdapter {
        &self.detector
    }

    pub fn recognizer(&self) -> &TextRecognitionAdapter {
        &self.recognizer
    }
}
