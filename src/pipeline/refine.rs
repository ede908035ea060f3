//! Confidence-gated second recognition pass.
//!
//! Records that are both weak (`confidence < confidence_floor`) and short
//! (`chars < text_length_ceiling`) are cut into vertical slices along minima
//! of the detector score map of their crop. All slices of all such records
//! are recognized in one batch; confident slices replace the record's text.

use image::{RgbImage, imageops};
use tracing::{debug, info, warn};

use crate::core::OCRError;
use crate::pipeline::config::{NoAcceptPolicy, RefineConfig};
use crate::pipeline::context::OcrContext;
use crate::pipeline::result::OutputRecord;
use crate::processors::segmentation::{SegmentAxis, segment_image};
use crate::utils::region_crop::{KeyedCrops, RegionCrop};

/// Parameters of [`refine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefineParams {
    /// Records below this confidence are re-read. Values above 1.0 act as 1.0.
    pub confidence_floor: f32,
    /// Keep every n-th vertical cut.
    pub subsegment_length: usize,
    /// Only records with fewer characters are re-read.
    pub text_length_ceiling: usize,
    /// Slices must be strictly more confident than this to be accepted.
    pub accept_floor: f32,
    /// Handling of records without accepted slices.
    pub no_accept_policy: NoAcceptPolicy,
}

impl Default for RefineParams {
    fn default() -> Self {
        Self::from(&RefineConfig::default())
    }
}

impl From<&RefineConfig> for RefineParams {
    fn from(config: &RefineConfig) -> Self {
        Self {
            confidence_floor: config.confidence_floor,
            subsegment_length: config.subsegment_length,
            text_length_ceiling: config.text_length_ceiling,
            accept_floor: config.accept_floor,
            no_accept_policy: config.no_accept_policy,
        }
    }
}

impl RefineParams {
    /// Whether `record` qualifies for a second pass.
    ///
    /// A record with confidence 1.0 never qualifies.
    pub fn needs_refinement(&self, record: &OutputRecord) -> bool {
        record.confidence < self.confidence_floor.min(1.0)
            && record.text.chars().count() < self.text_length_ceiling
    }
}

/// Re-reads low-confidence records slice by slice.
///
/// Each qualifying record is cropped from `image` by its geometry, the crop is
/// run through the detector and segmented vertically with unlimited cuts,
/// and the cuts are coarsened to every `subsegment_length`-th one. The texts
/// of slices with confidence above `accept_floor` are concatenated in slice
/// order and the record confidence becomes their mean. Records that do not
/// qualify are returned unchanged, in their original order.
///
/// # Errors
///
/// Only a failure of the batched recognizer call is returned. Records whose
/// crop or detection fails are left untouched.
pub fn refine(
    ctx: &OcrContext,
    image: &RgbImage,
    mut records: Vec<OutputRecord>,
    params: &RefineParams,
) -> Result<Vec<OutputRecord>, OCRError> {
    let mut slices = KeyedCrops::new();
    let mut marked: Vec<(usize, Vec<String>)> = Vec::new();

    for (idx, record) in records.iter().enumerate() {
        if !params.needs_refinement(record) {
            continue;
        }
        match slice_record(ctx, image, record, params.subsegment_length) {
            Ok(parts) => {
                let keys = parts
                    .into_iter()
                    .map(|(key, slice)| slices.insert(key, slice))
                    .collect();
                marked.push((idx, keys));
            }
            Err(err) => warn!(record = idx, error = %err, "cannot slice record, keeping it"),
        }
    }

    if slices.is_empty() {
        return Ok(records);
    }

    let results = ctx.recognizer().recognize(&slices)?;

    for (idx, keys) in &marked {
        let accepted: Vec<_> = keys
            .iter()
            .filter_map(|key| results.get(key))
            .filter(|result| result.confidence > params.accept_floor)
            .collect();
        let record = &mut records[*idx];

        if accepted.is_empty() {
            if params.no_accept_policy == NoAcceptPolicy::Clear {
                record.text.clear();
            }
            debug!(record = idx, slices = keys.len(), "no slice accepted");
            continue;
        }

        record.text = accepted.iter().map(|r| r.text.as_str()).collect();
        record.confidence =
            accepted.iter().map(|r| r.confidence).sum::<f32>() / accepted.len() as f32;
        debug!(
            record = idx,
            slices = keys.len(),
            accepted = accepted.len(),
            text = %record.text,
            "record refined"
        );
    }

    info!(
        refined = marked.len(),
        slices = slices.len(),
        "refinement pass finished"
    );
    Ok(records)
}

/// Cuts a record's crop into vertical slices keyed `"{start}-{end}"`.
fn slice_record(
    ctx: &OcrContext,
    image: &RgbImage,
    record: &OutputRecord,
    subsegment_length: usize,
) -> Result<Vec<(String, RgbImage)>, OCRError> {
    let crop = RegionCrop::crop(image, &record.geometry.to_region())?;
    let detection = ctx.detector().detect(&crop)?;

    let cuts = segment_image(
        &detection.score_map,
        SegmentAxis::Vertical,
        None,
        crop.width() as usize,
    )
    .stride(subsegment_length);

    Ok(cuts
        .segments()
        .into_iter()
        .map(|cols| {
            let key = format!("{}-{}", cols.start, cols.end);
            let slice = imageops::crop_imm(
                &crop,
                cols.start as u32,
                0,
                cols.len() as u32,
                crop.height(),
            )
            .to_image();
            (key, slice)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::config::OcrConfig;
    use crate::pipeline::result::Geometry;
    use crate::testing::{FakeDetector, FakeRecognizer, page_with_ink};
    use std::sync::Arc;

    fn context(recognizer: FakeRecognizer) -> OcrContext {
        let mut config = OcrConfig::default();
        config.detector.mag_ratio = 1.0;
        OcrContext::from_models(Arc::new(FakeDetector), Arc::new(recognizer), &config).unwrap()
    }

    /// Three words on one line, each 20 px wide with 10 px gaps.
    fn words() -> RgbImage {
        page_with_ink(
            120,
            40,
            &[(10..30, 10..26), (40..60, 10..26), (70..90, 10..26)],
        )
    }

    fn weak_record(text: &str, confidence: f32) -> OutputRecord {
        OutputRecord::new(
            text,
            confidence,
            Geometry::Rect {
                x1: 0,
                y1: 0,
                x2: 120,
                y2: 40,
            },
        )
    }

    #[test]
    fn test_confident_record_is_untouched() {
        let ctx = context(FakeRecognizer::reading("zz"));
        let records = vec![weak_record("abc", 0.9)];
        let params = RefineParams::default();

        let refined = refine(&ctx, &words(), records.clone(), &params).unwrap();
        assert_eq!(refined, records);
    }

    #[test]
    fn test_full_confidence_is_never_resegmented() {
        // A failing recognizer proves nothing is sent for recognition
        let ctx = context(FakeRecognizer::failing());
        let params = RefineParams {
            confidence_floor: 2.0,
            ..Default::default()
        };
        let records = vec![weak_record("abc", 1.0)];

        let refined = refine(&ctx, &words(), records.clone(), &params).unwrap();
        assert_eq!(refined, records);
    }

    #[test]
    fn test_long_text_is_not_refined() {
        let ctx = context(FakeRecognizer::failing());
        let params = RefineParams {
            text_length_ceiling: 3,
            ..Default::default()
        };
        let records = vec![weak_record("abc", 0.1)];
        assert_eq!(refine(&ctx, &words(), records.clone(), &params).unwrap(), records);
    }

    #[test]
    fn test_accepted_slices_replace_text() {
        let ctx = context(FakeRecognizer::reading("ab"));
        let params = RefineParams {
            subsegment_length: 1,
            ..Default::default()
        };

        let refined = refine(&ctx, &words(), vec![weak_record("?", 0.2)], &params).unwrap();
        let record = &refined[0];
        assert!(!record.text.is_empty());
        assert_eq!(record.text.len() % 2, 0);
        assert!(record.text.chars().collect::<Vec<_>>().chunks(2).all(|c| c == ['a', 'b']));
        assert!(record.confidence > 0.8);
    }

    #[test]
    fn test_unaccepted_slices_clear_text_by_default() {
        // Peak 1.0 decodes with low confidence
        let ctx = context(FakeRecognizer::blocks(vec![("ab", 1.0)]));
        let params = RefineParams::default();

        let refined = refine(&ctx, &words(), vec![weak_record("old", 0.2)], &params).unwrap();
        assert_eq!(refined[0].text, "");
        assert_eq!(refined[0].confidence, 0.2);
    }

    #[test]
    fn test_keep_policy_leaves_record_untouched() {
        let ctx = context(FakeRecognizer::blocks(vec![("ab", 1.0)]));
        let params = RefineParams {
            no_accept_policy: NoAcceptPolicy::Keep,
            ..Default::default()
        };
        let records = vec![weak_record("old", 0.2)];

        let refined = refine(&ctx, &words(), records.clone(), &params).unwrap();
        assert_eq!(refined, records);
    }

    #[test]
    fn test_unreadable_record_is_kept() {
        let ctx = context(FakeRecognizer::reading("ab"));
        let outside = OutputRecord::new(
            "old",
            0.2,
            Geometry::Rect {
                x1: 500,
                y1: 500,
                x2: 600,
                y2: 600,
            },
        );
        let records = vec![outside, weak_record("x", 0.9)];

        let refined = refine(&ctx, &words(), records.clone(), &RefineParams::default()).unwrap();
        assert_eq!(refined, records);
    }

    #[test]
    fn test_recognizer_failure_is_fatal() {
        let ctx = context(FakeRecognizer::failing());
        let result = refine(
            &ctx,
            &words(),
            vec![weak_record("?", 0.2)],
            &RefineParams::default(),
        );
        assert!(result.is_err());
    }
}
