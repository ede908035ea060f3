//! Adapters turning raw model tensors into pipeline-level results.

pub mod text_detection_adapter;
pub mod text_recognition_adapter;

pub use text_detection_adapter::{TextDetectionAdapter, TextDetectionAdapterBuilder};
pub use text_recognition_adapter::{
    TextRecognitionAdapter, TextRecognitionAdapterBuilder, select_best_block,
};
