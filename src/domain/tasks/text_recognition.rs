//! Text recognition configuration.

use serde::{Deserialize, Serialize};

use crate::impl_config_validator;
use crate::processors::decode::{DEFAULT_CHARSET, PRINTABLE_CHARSET};

/// Configuration for text recognition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextRecognitionConfig {
    /// Recognizer input height (default: 32)
    pub img_h: u32,
    /// Recognizer input width (default: 100)
    pub img_w: u32,
    /// Feed RGB crops instead of grayscale (default: false)
    pub rgb: bool,
    /// Keep the crop aspect ratio and pad on the right (default: false)
    pub keep_ratio_with_pad: bool,
    /// Crops per recognizer call (default: 32)
    pub batch_size: usize,
    /// Longest text the recognizer emits (default: 25)
    pub batch_max_length: usize,
    /// Recognizable characters, in model output order
    pub character: String,
    /// Use the case-sensitive printable character set instead of `character`
    pub sensitive: bool,
    /// Apply softmax to the recognizer scores before decoding (default: true)
    pub apply_softmax: bool,
}

impl Default for TextRecognitionConfig {
    fn default() -> Self {
        Self {
            img_h: 32,
            img_w: 100,
            rgb: false,
            keep_ratio_with_pad: false,
            batch_size: 32,
            batch_max_length: 25,
            character: DEFAULT_CHARSET.to_string(),
            sensitive: false,
            apply_softmax: true,
        }
    }
}

impl TextRecognitionConfig {
    /// The character set in effect.
    pub fn charset(&self) -> &str {
        if self.sensitive {
            PRINTABLE_CHARSET
        } else {
            &self.character
        }
    }

    /// Number of input channels the recognizer expects.
    pub fn input_channels(&self) -> usize {
        if self.rgb { 3 } else { 1 }
    }
}

impl_config_validator!(TextRecognitionConfig {
    img_h: min(1),
    img_w: min(1),
    batch_size: min(1),
    batch_max_length: min(1),
});
