//! Image and tensor processing stages.
//!
//! Everything here is model-agnostic: detector canvas resizing and
//! normalization, region extraction from heatmaps, geometry, heatmap
//! segmentation and greedy decoding of recognizer outputs.

pub mod craft_postprocess;
pub mod decode;
pub mod geometry;
pub mod normalization;
pub mod resize;
pub mod segmentation;

pub use craft_postprocess::{CraftPostProcess, DetectionThresholds};
pub use decode::{
    AttnLabelConverter, DEFAULT_CHARSET, GreedyDecoder, PRINTABLE_CHARSET, RecognitionResult,
};
pub use geometry::{MinAreaRect, Point, Region, convex_hull, sort_box_points};
pub use normalization::{IMAGENET_MEAN, IMAGENET_STD, NormalizeImage};
pub use resize::{AlignResize, CANVAS_ALIGNMENT, CanvasResize, ResizedImage};
pub use segmentation::{CutLineSet, ScoreMap, SegmentAxis, local_minima, segment, segment_image};
