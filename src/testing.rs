//! Deterministic stand-ins for the external models, shared by unit tests.

use std::ops::Range;

use image::{Rgb, RgbImage};
use ndarray::{Array2, Array3, Array4, ArrayView3, ArrayView4, Axis};

use crate::core::{DetectionModel, OCRError, RecognitionModel};
use crate::processors::decode::{AttnLabelConverter, DEFAULT_CHARSET};

/// White page with black rectangles at `(columns, rows)`.
pub fn page_with_ink(width: u32, height: u32, ink: &[(Range<u32>, Range<u32>)]) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        if ink.iter().any(|(xs, ys)| xs.contains(&x) && ys.contains(&y)) {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    })
}

/// Detector that scores dark pixels as text.
///
/// The text score of a heatmap cell is `0.9 * ink + 0.1 * blur(ink)` where
/// `ink` is the dark fraction of the 2x2 input block and `blur` a 5x5 box
/// filter. The blur term gives gaps between lines a strict minimum in the
/// middle. The link score is always 0.
#[derive(Debug)]
pub struct FakeDetector;

impl DetectionModel for FakeDetector {
    fn name(&self) -> &str {
        "fake-detector"
    }

    fn infer(&self, batch: ArrayView4<f32>) -> Result<Array4<f32>, OCRError> {
        let (n, _, h, w) = batch.dim();
        let (mh, mw) = (h / 2, w / 2);
        let mut out = Array4::<f32>::zeros((n, mh, mw, 2));

        for i in 0..n {
            let mut ink = Array2::<f32>::zeros((mh, mw));
            for y in 0..mh {
                for x in 0..mw {
                    let dark = [(0, 0), (0, 1), (1, 0), (1, 1)]
                        .iter()
                        .filter(|(dy, dx)| batch[[i, 0, 2 * y + dy, 2 * x + dx]] < -1.0)
                        .count();
                    ink[[y, x]] = dark as f32 / 4.0;
                }
            }

            for y in 0..mh {
                for x in 0..mw {
                    let mut blur = 0.0;
                    for yy in y.saturating_sub(2)..(y + 3).min(mh) {
                        for xx in x.saturating_sub(2)..(x + 3).min(mw) {
                            blur += ink[[yy, xx]];
                        }
                    }
                    out[[i, y, x, 0]] = 0.9 * ink[[y, x]] + 0.1 * blur / 25.0;
                }
            }
        }
        Ok(out)
    }
}

/// [`FakeDetector`] that refuses canvases shorter than `min_canvas_height`.
#[derive(Debug)]
pub struct PickyDetector {
    pub min_canvas_height: usize,
}

impl DetectionModel for PickyDetector {
    fn name(&self) -> &str {
        "picky-detector"
    }

    fn infer(&self, batch: ArrayView4<f32>) -> Result<Array4<f32>, OCRError> {
        let height = batch.dim().2;
        if height < self.min_canvas_height {
            return Err(OCRError::detection_error(format!(
                "canvas height {height} below {}",
                self.min_canvas_height
            )));
        }
        FakeDetector.infer(batch)
    }
}

/// Recognizer emitting one-hot logits per block.
///
/// By default every crop in a batch reads the block's text. A shade reader
/// instead reads each crop's mean intensity as a digit from `0` (black) to
/// `5` (white). The logit of the expected symbol at each position is the
/// block's peak, all others are 0.
#[derive(Debug)]
pub struct FakeRecognizer {
    blocks: Vec<(String, f32)>,
    read_shade: bool,
    fail: bool,
}

impl FakeRecognizer {
    /// One confident block reading `text`.
    pub fn reading(text: &str) -> Self {
        Self::blocks(vec![(text, 12.0)])
    }

    /// One block per `(text, peak)` pair.
    pub fn blocks(blocks: Vec<(&str, f32)>) -> Self {
        Self {
            blocks: blocks
                .into_iter()
                .map(|(text, peak)| (text.to_string(), peak))
                .collect(),
            read_shade: false,
            fail: false,
        }
    }

    /// One confident block reading each crop's shade.
    pub fn shade_reader() -> Self {
        Self {
            read_shade: true,
            ..Self::reading("")
        }
    }

    /// A recognizer whose every call fails.
    pub fn failing() -> Self {
        Self {
            blocks: Vec::new(),
            read_shade: false,
            fail: true,
        }
    }
}

/// Digit for a crop normalized to `[-1, 1]`.
fn shade_digit(crop: ArrayView3<f32>) -> String {
    let mean = crop.mean().unwrap_or(-1.0);
    let level = ((mean + 1.0) / 2.0 * 5.0).round() as u32;
    level.min(5).to_string()
}

impl RecognitionModel for FakeRecognizer {
    fn name(&self) -> &str {
        "fake-recognizer"
    }

    fn infer(&self, batch: ArrayView4<f32>) -> Result<Vec<Array3<f32>>, OCRError> {
        if self.fail {
            return Err(OCRError::inference_error(
                "fake-recognizer",
                "forward",
                std::io::Error::other("recognizer unavailable"),
            ));
        }

        let converter = AttnLabelConverter::new(DEFAULT_CHARSET);
        let n = batch.dim().0;
        let positions = 26;

        Ok(self
            .blocks
            .iter()
            .map(|(text, peak)| {
                let mut scores = Array3::<f32>::zeros((n, positions, converter.num_classes()));
                for i in 0..n {
                    let symbols = if self.read_shade {
                        converter.encode(&shade_digit(batch.index_axis(Axis(0), i)))
                    } else {
                        converter.encode(text)
                    };
                    for (pos, &symbol) in symbols.iter().skip(1).enumerate().take(positions) {
                        scores[[i, pos, symbol]] = *peak;
                    }
                }
                scores
            })
            .collect())
    }
}
