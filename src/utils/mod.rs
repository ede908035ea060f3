//! Utility functions for the OCR pipeline.
//!
//! This module provides image loading, region cropping and perspective
//! rectification helpers, plus logging setup.

pub mod image;
pub mod region_crop;
pub mod transform;

pub use self::image::{dilate_channels, load_image};
pub use region_crop::{Keyed, KeyedCrops, KeyedResults, RegionCrop};
pub use transform::{four_point_transform, get_perspective_transform, rectified_size};

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and formatting layer.
/// It's typically called at the start of an application to enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
