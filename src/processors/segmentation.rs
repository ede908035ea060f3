//! Heatmap-driven line and word segmentation.
//!
//! A text score map is projected onto one axis by summation. Strict interior
//! local minima of that profile are candidate cut lines between text lines
//! (rows) or words (columns). The resulting [`CutLineSet`] always starts at 0
//! and ends at the last index, so consecutive cuts partition the axis.

use ndarray::{Array2, ArrayView1, Axis};
use std::ops::Range;

/// A text score map at reduced resolution.
///
/// `scale` maps score map coordinates back to image coordinates:
/// `image = map * scale`.
#[derive(Debug, Clone)]
pub struct ScoreMap {
    /// Text-presence scores, `[rows, cols]`.
    pub scores: Array2<f32>,
    /// Factor mapping map coordinates to image coordinates.
    pub scale: f32,
}

impl ScoreMap {
    /// Creates a new score map.
    pub fn new(scores: Array2<f32>, scale: f32) -> Self {
        Self { scores, scale }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.scores.nrows()
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.scores.ncols()
    }

    /// Returns the sub-map covering `rows`, clamped to the map.
    pub fn band(&self, rows: Range<usize>) -> ScoreMap {
        let end = rows.end.min(self.rows());
        let start = rows.start.min(end);
        ScoreMap {
            scores: self.scores.slice(ndarray::s![start..end, ..]).to_owned(),
            scale: self.scale,
        }
    }

    /// Sums the map along the direction orthogonal to `axis`.
    pub fn profile(&self, axis: SegmentAxis) -> Vec<f32> {
        match axis {
            SegmentAxis::Horizontal => self.scores.sum_axis(Axis(1)).to_vec(),
            SegmentAxis::Vertical => self.scores.sum_axis(Axis(0)).to_vec(),
        }
    }
}

/// Direction of the cut lines to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentAxis {
    /// Horizontal cut lines between text lines, from per-row sums.
    Horizontal,
    /// Vertical cut lines between words, from per-column sums.
    Vertical,
}

/// Strictly increasing cut positions along one axis.
///
/// The first cut is 0 and the last is `extent - 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutLineSet {
    cuts: Vec<usize>,
}

impl CutLineSet {
    /// The single full-span set `[0, extent - 1]`.
    pub fn full(extent: usize) -> Self {
        Self::from_positions(std::iter::empty(), extent)
    }

    /// Builds a set from arbitrary positions, restoring the invariants.
    ///
    /// Positions are clamped to `extent - 1`, sorted, deduplicated, and the
    /// boundaries 0 and `extent - 1` are inserted when missing.
    pub fn from_positions(positions: impl IntoIterator<Item = usize>, extent: usize) -> Self {
        let last = extent.saturating_sub(1);
        let mut cuts: Vec<usize> = positions.into_iter().map(|p| p.min(last)).collect();
        cuts.push(0);
        cuts.push(last);
        cuts.sort_unstable();
        cuts.dedup();
        Self { cuts }
    }

    /// The cut positions.
    pub fn cuts(&self) -> &[usize] {
        &self.cuts
    }

    /// Number of cuts.
    pub fn len(&self) -> usize {
        self.cuts.len()
    }

    /// Always false; a set holds at least one cut.
    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }

    /// Last cut, equal to `extent - 1`.
    pub fn last(&self) -> usize {
        self.cuts.last().copied().unwrap_or(0)
    }

    /// Maps cuts into image space.
    ///
    /// Each cut is multiplied by `scale` and truncated. The result is clamped
    /// to `image_extent - 1`, the last cut is forced to `image_extent - 1`,
    /// and duplicates created by the scaling are dropped.
    pub fn to_image_space(&self, scale: f32, image_extent: usize) -> CutLineSet {
        let last = image_extent.saturating_sub(1);
        let mut cuts: Vec<usize> = self
            .cuts
            .iter()
            .map(|&c| ((c as f32 * scale) as usize).min(last))
            .collect();
        if let Some(tail) = cuts.last_mut() {
            *tail = last;
        }
        cuts.dedup();
        CutLineSet { cuts }
    }

    /// Half-open ranges between consecutive cuts.
    ///
    /// The final range also includes the last cut so the segments tile
    /// `0..extent`. A set with a single cut yields one one-pixel segment.
    pub fn segments(&self) -> Vec<Range<usize>> {
        match self.cuts.as_slice() {
            [] => Vec::new(),
            [only] => vec![*only..*only + 1],
            cuts => {
                let n = cuts.len() - 1;
                cuts.windows(2)
                    .enumerate()
                    .map(|(i, w)| {
                        let end = if i + 1 == n { w[1] + 1 } else { w[1] };
                        w[0]..end
                    })
                    .collect()
            }
        }
    }

    /// Keeps every `n`-th cut plus the last one.
    ///
    /// The first cut is always kept, so the result has at least one segment
    /// whenever the input does.
    pub fn stride(&self, n: usize) -> CutLineSet {
        let n = n.max(1);
        let mut cuts: Vec<usize> = self.cuts.iter().step_by(n).copied().collect();
        if let Some(&last) = self.cuts.last() {
            if cuts.last() != Some(&last) {
                cuts.push(last);
            }
        }
        CutLineSet { cuts }
    }
}

/// Indices of strict interior local minima of `profile`.
pub fn local_minima(profile: ArrayView1<f32>) -> Vec<usize> {
    if profile.len() < 3 {
        return Vec::new();
    }
    (1..profile.len() - 1)
        .filter(|&i| profile[i] < profile[i - 1] && profile[i] < profile[i + 1])
        .collect()
}

/// Finds cut lines in score map coordinates.
///
/// # Arguments
///
/// * `score_map` - The map to segment.
/// * `axis` - Which cut lines to look for.
/// * `max_cuts` - Keep at most this many interior cuts, preferring the lowest
///   profile values. `None` keeps all of them.
///
/// # Returns
///
/// A [`CutLineSet`] over the projected axis of the map. Use
/// [`segment_image`] for cuts in image coordinates.
pub fn segment(score_map: &ScoreMap, axis: SegmentAxis, max_cuts: Option<usize>) -> CutLineSet {
    let profile = score_map.profile(axis);
    let extent = profile.len();
    if extent == 0 {
        return CutLineSet::full(0);
    }

    let mut minima = local_minima(ArrayView1::from(profile.as_slice()));

    if let Some(limit) = max_cuts {
        if minima.len() > limit {
            // Stable sort keeps earlier positions first among equal values
            minima.sort_by(|&a, &b| profile[a].total_cmp(&profile[b]));
            minima.truncate(limit);
            minima.sort_unstable();
        }
    }

    let cuts = CutLineSet::from_positions(minima, extent);
    tracing::debug!(
        ?axis,
        extent,
        cuts = cuts.len(),
        "segmented score map"
    );
    cuts
}

/// [`segment`] followed by [`CutLineSet::to_image_space`] with the map's
/// own scale, for an image axis of `image_extent` pixels.
pub fn segment_image(
    score_map: &ScoreMap,
    axis: SegmentAxis,
    max_cuts: Option<usize>,
    image_extent: usize,
) -> CutLineSet {
    segment(score_map, axis, max_cuts).to_image_space(score_map.scale, image_extent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    fn assert_invariants(set: &CutLineSet, extent: usize) {
        let cuts = set.cuts();
        assert_eq!(cuts.first(), Some(&0));
        assert_eq!(cuts.last(), Some(&(extent - 1)));
        assert!(cuts.windows(2).all(|w| w[0] < w[1]), "not increasing: {:?}", cuts);
    }

    fn rows_map(profile: &[f32], cols: usize) -> ScoreMap {
        let mut scores = Array2::<f32>::zeros((profile.len(), cols));
        for (y, v) in profile.iter().enumerate() {
            scores.row_mut(y).fill(*v / cols as f32);
        }
        ScoreMap::new(scores, 2.0)
    }

    #[test]
    fn test_local_minima_are_strict_and_interior() {
        let p = Array1::from(vec![0.0, 1.0, 0.5, 0.5, 1.0, 0.2, 3.0, 0.0]);
        // plateau at 2..=3 is not strict, endpoints never count
        assert_eq!(local_minima(p.view()), vec![5]);
    }

    #[test]
    fn test_no_minima_gives_full_span() {
        let map = rows_map(&[0.0, 1.0, 2.0, 3.0, 4.0], 4);
        let set = segment(&map, SegmentAxis::Horizontal, Some(10));
        assert_eq!(set.cuts(), &[0, 4]);
    }

    #[test]
    fn test_max_cuts_keeps_deepest_minima_sorted_by_position() {
        // minima at 2 (0.5), 5 (0.1), 8 (0.3)
        let profile = [2.0, 1.0, 0.5, 1.0, 2.0, 0.1, 2.0, 1.0, 0.3, 1.0, 2.0];
        let map = rows_map(&profile, 3);

        let limited = segment(&map, SegmentAxis::Horizontal, Some(2));
        assert_eq!(limited.cuts(), &[0, 5, 8, 10]);
        assert!(limited.len() <= 2 + 2);

        let unlimited = segment(&map, SegmentAxis::Horizontal, None);
        assert_eq!(unlimited.cuts(), &[0, 2, 5, 8, 10]);
        assert_invariants(&unlimited, profile.len());
    }

    #[test]
    fn test_equal_minima_prefer_earlier_positions() {
        let profile = [1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0];
        let map = rows_map(&profile, 1);
        let set = segment(&map, SegmentAxis::Horizontal, Some(2));
        assert_eq!(set.cuts(), &[0, 1, 3, 6]);
    }

    #[test]
    fn test_vertical_axis_uses_column_sums() {
        let mut scores = Array2::<f32>::ones((4, 9));
        scores.column_mut(4).fill(0.0);
        let map = ScoreMap::new(scores, 1.0);
        assert_eq!(segment(&map, SegmentAxis::Vertical, None).cuts(), &[0, 4, 8]);
        assert_eq!(segment(&map, SegmentAxis::Horizontal, None).cuts(), &[0, 3]);
    }

    #[test]
    fn test_cut_line_invariants_hold_for_many_profiles() {
        for seed in 0..40u32 {
            let len = 3 + (seed as usize * 7) % 50;
            let profile: Vec<f32> = (0..len)
                .map(|i| ((i as u32).wrapping_mul(2654435761).wrapping_add(seed * 97) % 13) as f32)
                .collect();
            let map = rows_map(&profile, 2);
            for max_cuts in [Some(0), Some(1), Some(3), None] {
                let set = segment(&map, SegmentAxis::Horizontal, max_cuts);
                assert_invariants(&set, len);
                if let Some(limit) = max_cuts {
                    assert!(set.len() <= limit + 2);
                }
            }
        }
    }

    #[test]
    fn test_to_image_space_keeps_invariants() {
        let set = CutLineSet::from_positions([1, 2, 12], 25);
        let image = set.to_image_space(2.0, 50);
        assert_eq!(image.cuts(), &[0, 2, 4, 24, 49]);

        // Scaling down collapses neighbours
        let squeezed = CutLineSet::from_positions([1, 2, 3], 5).to_image_space(0.5, 3);
        assert_eq!(squeezed.cuts(), &[0, 1, 2]);
        assert_invariants(&squeezed, 3);
    }

    #[test]
    fn test_image_space_invariants_hold_for_fractional_scales() {
        let profile = [3.0, 1.0, 2.0, 0.5, 2.0, 0.1, 4.0, 0.2, 1.0, 0.3, 2.0];
        for scale in [2.0 / 1.5, 2.0 / 0.7, 2.0 / 3.0, 0.3, 1.0] {
            let map = ScoreMap::new(rows_map(&profile, 2).scores, scale);
            let natural = (profile.len() as f32 * scale).ceil() as usize;
            for extent in [1, 2, 3, natural, natural + 5] {
                for max_cuts in [Some(0), Some(2), None] {
                    let set = segment_image(&map, SegmentAxis::Horizontal, max_cuts, extent);
                    assert_invariants(&set, extent);
                    if let Some(limit) = max_cuts {
                        assert!(set.len() <= limit + 2);
                    }
                    let covered: usize = set.segments().iter().map(|r| r.len()).sum();
                    assert_eq!(covered, extent);
                }
            }
        }
    }

    #[test]
    fn test_segment_image_maps_cuts_with_map_scale() {
        let profile = [2.0, 1.0, 0.5, 1.0, 2.0, 0.1, 2.0];
        let map = ScoreMap::new(rows_map(&profile, 1).scores, 2.0 / 1.5);
        // Map cuts [0, 2, 5, 6] scale to 0, 2.67, 6.67, 8.0
        let set = segment_image(&map, SegmentAxis::Horizontal, None, 9);
        assert_eq!(set.cuts(), &[0, 2, 6, 8]);
    }

    #[test]
    fn test_segments_tile_the_extent() {
        let set = CutLineSet::from_positions([24], 60);
        let segments = set.segments();
        assert_eq!(segments, vec![0..24, 24..60]);
        let covered: usize = segments.iter().map(|r| r.len()).sum();
        assert_eq!(covered, 60);
    }

    #[test]
    fn test_stride_keeps_first_and_last() {
        let set = CutLineSet::from_positions([3, 6, 9, 12, 15, 18, 21], 25);
        assert_eq!(set.stride(3).cuts(), &[0, 9, 18, 24]);
        assert_eq!(set.stride(100).cuts(), &[0, 24]);
        assert_eq!(set.stride(1), set);
    }

    #[test]
    fn test_band_restricts_rows() {
        let map = rows_map(&[1.0, 2.0, 3.0, 4.0], 2);
        let band = map.band(1..3);
        assert_eq!(band.rows(), 2);
        assert_eq!(band.cols(), 2);
        assert_eq!(band.scale, 2.0);
        assert_eq!(map.band(3..10).rows(), 1);
    }
}
