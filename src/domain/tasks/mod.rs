//! Task configurations and outputs for the detection and recognition stages.

pub mod text_detection;
pub mod text_recognition;

pub use text_detection::{Detection, DetectionTransform, TextDetectionConfig};
pub use text_recognition::TextRecognitionConfig;
