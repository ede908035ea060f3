//! Domain layer: task configurations and the adapters that wrap the external
//! detection and recognition models.

pub mod adapters;
pub mod tasks;

pub use adapters::{
    TextDetectionAdapter, TextDetectionAdapterBuilder, TextRecognitionAdapter,
    TextRecognitionAdapterBuilder, select_best_block,
};
pub use tasks::{Detection, DetectionTransform, TextDetectionConfig, TextRecognitionConfig};
