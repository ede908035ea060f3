//! Text Recognition Adapter
//!
//! This adapter encodes keyed crops for an attention recognizer, runs it in
//! fixed-size batches, decodes every prediction block greedily and keeps the
//! most confident block per crop.

use std::sync::Arc;

use image::{RgbImage, imageops};
use ndarray::{Array4, Axis};
use tracing::debug;

use crate::core::config::ConfigValidator;
use crate::core::{OCRError, RecognitionModel};
use crate::domain::tasks::TextRecognitionConfig;
use crate::processors::decode::{AttnLabelConverter, GreedyDecoder, RecognitionResult};
use crate::processors::normalization::NormalizeImage;
use crate::processors::resize::AlignResize;
use crate::utils::region_crop::{KeyedCrops, KeyedResults};

/// Picks the most confident candidate.
///
/// A later candidate replaces the current best only with a strictly higher
/// confidence, so ties go to the lowest index.
pub fn select_best_block(
    candidates: impl IntoIterator<Item = RecognitionResult>,
) -> Option<RecognitionResult> {
    candidates.into_iter().fold(None, |best, candidate| match best {
        Some(current) if candidate.confidence <= current.confidence => Some(current),
        _ => Some(candidate),
    })
}

/// Text recognition adapter around a [`RecognitionModel`].
#[derive(Debug, Clone)]
pub struct TextRecognitionAdapter {
    /// The underlying recognizer
    model: Arc<dyn RecognitionModel>,
    /// Task configuration
    config: TextRecognitionConfig,
    resizer: AlignResize,
    normalizer: NormalizeImage,
    decoder: GreedyDecoder,
}

impl TextRecognitionAdapter {
    /// Creates a builder.
    pub fn builder() -> TextRecognitionAdapterBuilder {
        TextRecognitionAdapterBuilder::new()
    }

    /// The configuration in effect.
    pub fn config(&self) -> &TextRecognitionConfig {
        &self.config
    }

    /// The decoder, including its symbol table.
    pub fn decoder(&self) -> &GreedyDecoder {
        &self.decoder
    }

    /// Recognizes every crop.
    ///
    /// The output holds exactly the input keys, in input order.
    ///
    /// # Errors
    ///
    /// Fails when the recognizer fails or returns tensors that do not match
    /// the batch.
    pub fn recognize(&self, crops: &KeyedCrops) -> Result<KeyedResults, OCRError> {
        let entries: Vec<(&str, &RgbImage)> = crops.iter().collect();
        let mut results = KeyedResults::new();

        for chunk in entries.chunks(self.config.batch_size) {
            let images: Vec<&RgbImage> = chunk.iter().map(|(_, image)| *image).collect();
            let recognized = self.recognize_batch(&images)?;
            for ((key, _), result) in chunk.iter().zip(recognized) {
                results.insert(*key, result);
            }
        }

        debug!(
            model = self.model.name(),
            crops = results.len(),
            "recognized text crops"
        );
        Ok(results)
    }

    fn recognize_batch(&self, images: &[&RgbImage]) -> Result<Vec<RecognitionResult>, OCRError> {
        let batch = self.encode(images);
        let blocks = self.model.infer(batch.view())?;
        let num_classes = self.decoder.converter().num_classes();

        if blocks.is_empty() {
            return Err(OCRError::shape_mismatch(
                format!("recognizer '{}' returned no prediction blocks", self.model.name()),
                &[images.len(), self.config.batch_max_length + 1, num_classes],
                &[],
            ));
        }
        for block in &blocks {
            let (n, _, classes) = block.dim();
            if n != images.len() || classes != num_classes {
                return Err(OCRError::shape_mismatch(
                    format!("recognizer '{}' block", self.model.name()),
                    &[images.len(), self.config.batch_max_length + 1, num_classes],
                    block.shape(),
                ));
            }
        }

        let decoded: Vec<Vec<RecognitionResult>> = blocks
            .iter()
            .map(|block| self.decoder.decode_batch(block.view()))
            .collect();

        Ok((0..images.len())
            .map(|i| {
                select_best_block(decoded.iter().map(|block| block[i].clone())).unwrap_or_default()
            })
            .collect())
    }

    /// Resizes and normalizes crops into `[N, C, img_h, img_w]`.
    fn encode(&self, images: &[&RgbImage]) -> Array4<f32> {
        let mut batch = Array4::<f32>::zeros((
            images.len(),
            self.config.input_channels(),
            self.config.img_h as usize,
            self.config.img_w as usize,
        ));

        for (image, slot) in images.iter().zip(batch.axis_iter_mut(Axis(0))) {
            if self.config.rgb {
                self.normalizer.write_rgb(&self.resizer.apply(*image), slot);
            } else {
                let gray = imageops::grayscale(*image);
                self.normalizer.write_gray(&self.resizer.apply(&gray), slot);
            }
        }
        batch
    }
}

/// Builder for [`TextRecognitionAdapter`].
#[derive(Debug, Default)]
pub struct TextRecognitionAdapterBuilder {
    config: TextRecognitionConfig,
}

impl TextRecognitionAdapterBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the task configuration.
    pub fn with_config(mut self, config: TextRecognitionConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the number of crops per recognizer call.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Sets the recognizable characters.
    pub fn character(mut self, character: impl Into<String>) -> Self {
        self.config.character = character.into();
        self
    }

    /// Validates the configuration and builds the adapter.
    pub fn build(
        self,
        model: Arc<dyn RecognitionModel>,
    ) -> Result<TextRecognitionAdapter, OCRError> {
        self.config.validate()?;
        if self.config.charset().is_empty() {
            return Err(OCRError::config_error("character set must not be empty"));
        }

        let converter = AttnLabelConverter::new(self.config.charset());
        Ok(TextRecognitionAdapter {
            model,
            resizer: AlignResize::new(
                self.config.img_h,
                self.config.img_w,
                self.config.keep_ratio_with_pad,
            ),
            normalizer: NormalizeImage::unit_range(),
            decoder: GreedyDecoder::new(
                converter,
                self.config.apply_softmax,
                self.config.batch_max_length,
            ),
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRecognizer;
    use image::Rgb;

    fn crop(shade: u8) -> RgbImage {
        RgbImage::from_pixel(40, 12, Rgb([shade, shade, shade]))
    }

    fn adapter(recognizer: FakeRecognizer, batch_size: usize) -> TextRecognitionAdapter {
        TextRecognitionAdapter::builder()
            .batch_size(batch_size)
            .build(Arc::new(recognizer))
            .unwrap()
    }

    #[test]
    fn test_block_vote_prefers_strict_maximum() {
        let picked = select_best_block([
            RecognitionResult::new("a", 0.4),
            RecognitionResult::new("b", 0.9),
            RecognitionResult::new("c", 0.7),
        ]);
        assert_eq!(picked.unwrap().text, "b");
    }

    #[test]
    fn test_block_vote_ties_go_to_lowest_index() {
        let picked = select_best_block([
            RecognitionResult::new("first", 0.8),
            RecognitionResult::new("second", 0.8),
        ]);
        assert_eq!(picked.unwrap().text, "first");
        assert!(select_best_block(Vec::new()).is_none());
    }

    #[test]
    fn test_recognize_keeps_every_key_in_order() {
        let adapter = adapter(FakeRecognizer::reading("ab"), 2);
        let mut crops = KeyedCrops::new();
        for (i, key) in ["k0", "k1", "k2", "k3", "k4"].iter().enumerate() {
            crops.insert(*key, crop(i as u8 * 40));
        }

        let results = adapter.recognize(&crops).unwrap();
        assert_eq!(results.keys().collect::<Vec<_>>(), vec!["k0", "k1", "k2", "k3", "k4"]);
        assert!(results.values().all(|r| r.text == "ab"));
    }

    #[test]
    fn test_each_key_gets_its_own_crop_across_batches() {
        // Three batches of 2, 2 and 1 crops
        let adapter = adapter(FakeRecognizer::shade_reader(), 2);
        let shades = [255u8, 0, 153, 51, 204];
        let mut crops = KeyedCrops::new();
        for (i, &shade) in shades.iter().enumerate() {
            crops.insert(format!("k{i}"), crop(shade));
        }

        let results = adapter.recognize(&crops).unwrap();
        let read: Vec<(&str, &str)> = results.iter().map(|(k, r)| (k, r.text.as_str())).collect();
        assert_eq!(
            read,
            vec![("k0", "5"), ("k1", "0"), ("k2", "3"), ("k3", "1"), ("k4", "4")]
        );
    }

    #[test]
    fn test_best_block_is_selected_per_crop() {
        // Block 0 reads "x" weakly, block 1 reads "yz" strongly
        let recognizer = FakeRecognizer::blocks(vec![("x", 1.0), ("yz", 8.0)]);
        let adapter = adapter(recognizer, 8);
        let mut crops = KeyedCrops::new();
        crops.insert("only", crop(0));

        let results = adapter.recognize(&crops).unwrap();
        let result = results.get("only").unwrap();
        assert_eq!(result.text, "yz");
        assert!(result.confidence > 0.9);
    }

    #[test]
    fn test_empty_decode_has_zero_confidence() {
        let adapter = adapter(FakeRecognizer::reading(""), 8);
        let mut crops = KeyedCrops::new();
        crops.insert("blank", crop(255));

        let results = adapter.recognize(&crops).unwrap();
        assert_eq!(results.get("blank").unwrap().text, "");
        assert_eq!(results.get("blank").unwrap().confidence, 0.0);
    }

    #[test]
    fn test_missing_blocks_are_an_error() {
        let adapter = adapter(FakeRecognizer::blocks(Vec::new()), 8);
        let mut crops = KeyedCrops::new();
        crops.insert("only", crop(0));
        assert!(adapter.recognize(&crops).is_err());
    }

    #[test]
    fn test_empty_charset_is_rejected() {
        let result = TextRecognitionAdapter::builder()
            .character("")
            .build(Arc::new(FakeRecognizer::reading("a")));
        assert!(matches!(result, Err(OCRError::ConfigError { .. })));
    }
}
