//! Greedy decoding for attention-based text recognizers.
//!
//! The recognizer emits one score vector per output position. Decoding picks
//! the best symbol at every position, stops at the end-of-sequence marker and
//! scores the sequence with the product of the per-position maximum
//! probabilities.

use ndarray::{ArrayView1, ArrayView2, ArrayView3, Axis};
use serde::{Deserialize, Serialize};

/// Lowercase alphanumeric character set used when none is configured.
pub const DEFAULT_CHARSET: &str = "0123456789abcdefghijklmnopqrstuvwxyz";

/// Printable ASCII without whitespace: digits, letters and punctuation.
pub const PRINTABLE_CHARSET: &str = concat!(
    "0123456789",
    "abcdefghijklmnopqrstuvwxyz",
    "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~"
);

/// Text and confidence decoded for one crop.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecognitionResult {
    /// Decoded text, possibly empty.
    pub text: String,
    /// Sequence confidence in `[0, 1]`.
    pub confidence: f32,
}

impl RecognitionResult {
    /// Creates a new result.
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Maps between symbol indices and characters.
///
/// The symbol table is `["[GO]", "[s]", charset...]`: index 0 is the start
/// token, index 1 marks the end of the sequence.
#[derive(Debug, Clone)]
pub struct AttnLabelConverter {
    characters: Vec<char>,
}

impl AttnLabelConverter {
    /// Index of the start token.
    pub const GO: usize = 0;
    /// Index of the end-of-sequence marker.
    pub const EOS: usize = 1;

    /// Creates a converter over the characters of `charset`.
    pub fn new(charset: &str) -> Self {
        Self {
            characters: charset.chars().collect(),
        }
    }

    /// Number of output classes the recognizer must produce.
    pub fn num_classes(&self) -> usize {
        self.characters.len() + 2
    }

    /// Character for a symbol index; `None` for the special tokens and
    /// out-of-range indices.
    pub fn character(&self, index: usize) -> Option<char> {
        index
            .checked_sub(2)
            .and_then(|i| self.characters.get(i).copied())
    }

    /// Encodes text as `[GO] chars... [s]`, skipping unknown characters.
    pub fn encode(&self, text: &str) -> Vec<usize> {
        let mut indices = vec![Self::GO];
        indices.extend(
            text.chars()
                .filter_map(|c| self.characters.iter().position(|&k| k == c))
                .map(|i| i + 2),
        );
        indices.push(Self::EOS);
        indices
    }
}

/// Greedy decoder over `[T, C]` score matrices.
#[derive(Debug, Clone)]
pub struct GreedyDecoder {
    converter: AttnLabelConverter,
    apply_softmax: bool,
    max_positions: usize,
}

impl GreedyDecoder {
    /// Creates a decoder.
    ///
    /// # Arguments
    ///
    /// * `converter` - Symbol table.
    /// * `apply_softmax` - Convert raw scores to probabilities first. Disable
    ///   for models that already emit probabilities.
    /// * `max_length` - Longest text the recognizer produces; one extra
    ///   position is read for the end marker.
    pub fn new(converter: AttnLabelConverter, apply_softmax: bool, max_length: usize) -> Self {
        Self {
            converter,
            apply_softmax,
            max_positions: max_length + 1,
        }
    }

    /// The symbol table.
    pub fn converter(&self) -> &AttnLabelConverter {
        &self.converter
    }

    /// Decodes one sequence of scores, `[T, C]`.
    ///
    /// The confidence is the product of the maximum probabilities over the
    /// positions before the end marker, and exactly 0 when nothing precedes it.
    pub fn decode_sequence(&self, scores: ArrayView2<f32>) -> RecognitionResult {
        let mut text = String::new();
        let mut confidence = 1.0f32;

        for row in scores.axis_iter(Axis(0)).take(self.max_positions) {
            let Some((index, prob)) = self.best_symbol(row) else {
                break;
            };
            if index == AttnLabelConverter::EOS {
                break;
            }
            // [GO] and indices outside the table produce no text and no score
            if let Some(ch) = self.converter.character(index) {
                text.push(ch);
                confidence *= prob;
            }
        }

        if text.is_empty() {
            return RecognitionResult::new(text, 0.0);
        }
        RecognitionResult::new(text, confidence.clamp(0.0, 1.0))
    }

    /// Decodes every sequence of a `[N, T, C]` block.
    pub fn decode_batch(&self, scores: ArrayView3<f32>) -> Vec<RecognitionResult> {
        scores
            .axis_iter(Axis(0))
            .map(|sequence| self.decode_sequence(sequence))
            .collect()
    }

    /// Argmax of one position (lowest index on ties) and its probability.
    fn best_symbol(&self, row: ArrayView1<f32>) -> Option<(usize, f32)> {
        let (index, &max) = row
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1).then(b.0.cmp(&a.0)))?;

        let prob = if self.apply_softmax {
            let denom: f32 = row.iter().map(|&v| (v - max).exp()).sum();
            1.0 / denom
        } else {
            max
        };
        Some((index, prob))
    }
}
