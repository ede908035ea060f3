//! Pipeline configuration.
//!
//! [`OcrConfig`] bundles the detector and recognizer settings with the
//! segmentation, refinement and output options. Every section deserializes
//! from JSON with defaults for omitted fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::OCRError;
use crate::core::config::{ConfigError, ConfigValidator};
use crate::domain::tasks::{TextDetectionConfig, TextRecognitionConfig};
use crate::impl_config_validator;

/// How output geometry is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxRepresentation {
    /// Axis-aligned bounding rectangle of the region.
    #[default]
    Rectangle,
    /// The region's four corners.
    Polygon,
}

/// What refinement does with a record none of whose slices was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoAcceptPolicy {
    /// Clear the text and keep the confidence.
    #[default]
    Clear,
    /// Leave the record untouched.
    Keep,
}

/// Settings for split-aware OCR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Maximum number of interior horizontal cuts (default: 10)
    pub max_horizontal_cuts: usize,
    /// Maximum number of interior vertical cuts per line band (default: 5)
    pub max_vertical_cuts: usize,
    /// Also split each line band into words (default: false)
    pub split_vertically: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            max_horizontal_cuts: 10,
            max_vertical_cuts: 5,
            split_vertically: false,
        }
    }
}

/// Settings for the confidence-gated second pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineConfig {
    /// Records below this confidence are re-read (default: 0.5)
    pub confidence_floor: f32,
    /// Only records with fewer characters are re-read (default: 30)
    pub text_length_ceiling: usize,
    /// Slices above this confidence are accepted (default: 0.8)
    pub accept_floor: f32,
    /// Keep every n-th vertical cut when slicing a record (default: 7)
    pub subsegment_length: usize,
    /// Handling of records without accepted slices (default: clear)
    pub no_accept_policy: NoAcceptPolicy,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            confidence_floor: 0.5,
            text_length_ceiling: 30,
            accept_floor: 0.8,
            subsegment_length: 7,
            no_accept_policy: NoAcceptPolicy::Clear,
        }
    }
}

impl_config_validator!(RefineConfig {
    confidence_floor: min(0.0),
    accept_floor: range(0.0, 1.0),
    subsegment_length: min(1),
});

/// Complete pipeline configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Text detection settings.
    pub detector: TextDetectionConfig,
    /// Text recognition settings.
    pub recognizer: TextRecognitionConfig,
    /// Split-aware OCR settings.
    pub split: SplitConfig,
    /// Refinement settings.
    pub refine: RefineConfig,
    /// Output geometry representation.
    pub box_type: BoxRepresentation,
    /// Advisory padding is `region height / padding_ratio` when set.
    pub padding_ratio: Option<f32>,
}

impl OcrConfig {
    /// Parses a JSON configuration. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or when validation fails.
    pub fn from_json_str(json: &str) -> Result<Self, OCRError> {
        let config: OcrConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, OCRError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

impl ConfigValidator for OcrConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.detector.validate()?;
        self.recognizer.validate()?;
        self.refine.validate()?;
        if let Some(ratio) = self.padding_ratio {
            if ratio <= 0.0 {
                return Err(ConfigError::InvalidConfig {
                    message: format!("padding_ratio must be greater than 0, got {ratio}"),
                });
            }
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}
