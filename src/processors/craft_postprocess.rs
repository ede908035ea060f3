//! Region extraction from character-region and affinity heatmaps.
//!
//! The [`CraftPostProcess`] struct turns a text score map and a link score map
//! into quadrilateral text regions: both maps are binarized, merged, labelled
//! into connected components, filtered, optionally grown, and each surviving
//! component is fitted with a minimum-area rectangle. Coordinates stay in
//! heatmap space; the detector adapter maps them back to the image.

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use imageproc::region_labelling::{Connectivity, connected_components};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::processors::geometry::{MinAreaRect, Point, Region};

/// Thresholds forwarded to region extraction on every detection call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionThresholds {
    /// Minimum peak text score a component needs to be kept.
    pub text_threshold: f32,
    /// Link score above which a pixel joins neighbouring characters.
    pub link_threshold: f32,
    /// Text score above which a pixel belongs to a text component.
    pub low_text: f32,
    /// Grow each component before fitting its rectangle.
    pub expand_components: bool,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            text_threshold: 0.7,
            link_threshold: 0.4,
            low_text: 0.4,
            expand_components: true,
        }
    }
}

/// Pixel statistics of one labelled component.
#[derive(Debug, Default)]
struct Component {
    pixels: Vec<(u32, u32)>,
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    peak_text: f32,
}

impl Component {
    fn push(&mut self, x: u32, y: u32, text: f32) {
        if self.pixels.is_empty() {
            self.min_x = x;
            self.max_x = x;
            self.min_y = y;
            self.max_y = y;
            self.peak_text = text;
        } else {
            self.min_x = self.min_x.min(x);
            self.max_x = self.max_x.max(x);
            self.min_y = self.min_y.min(y);
            self.max_y = self.max_y.max(y);
            self.peak_text = self.peak_text.max(text);
        }
        self.pixels.push((x, y));
    }

    fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }
}

/// Post-processor for character-region detectors.
#[derive(Debug, Clone)]
pub struct CraftPostProcess {
    /// Components with fewer pixels are discarded (default: 10).
    pub min_component_size: usize,
    /// Fitted rectangles whose side ratio is within this distance of 1 are
    /// replaced by the axis-aligned box (default: 0.1).
    pub diamond_tolerance: f32,
}

impl Default for CraftPostProcess {
    fn default() -> Self {
        Self {
            min_component_size: 10,
            diamond_tolerance: 0.1,
        }
    }
}

impl CraftPostProcess {
    /// Creates a post-processor with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extracts text regions from a pair of score maps.
    ///
    /// # Arguments
    ///
    /// * `text` - Character region scores, `[H, W]`.
    /// * `link` - Affinity scores with the same shape as `text`.
    /// * `thresholds` - Binarization and filtering thresholds.
    ///
    /// # Returns
    ///
    /// Quadrilaterals in heatmap coordinates, in label order. Maps with
    /// mismatched shapes yield no regions.
    pub fn extract(
        &self,
        text: &ArrayView2<f32>,
        link: &ArrayView2<f32>,
        thresholds: &DetectionThresholds,
    ) -> Vec<Region> {
        if text.shape() != link.shape() {
            tracing::warn!(
                text_shape = ?text.shape(),
                link_shape = ?link.shape(),
                "text and link maps differ in shape, skipping region extraction"
            );
            return Vec::new();
        }

        let (height, width) = text.dim();
        if height == 0 || width == 0 {
            return Vec::new();
        }

        let text_mask = |x: usize, y: usize| text[[y, x]] > thresholds.low_text;
        let link_mask = |x: usize, y: usize| link[[y, x]] > thresholds.link_threshold;

        let mut combined = GrayImage::new(width as u32, height as u32);
        for y in 0..height {
            for x in 0..width {
                if text_mask(x, y) || link_mask(x, y) {
                    combined.put_pixel(x as u32, y as u32, Luma([255]));
                }
            }
        }

        let labels = connected_components(&combined, Connectivity::Four, Luma([0u8]));
        let label_count = labels.pixels().map(|p| p[0]).max().unwrap_or(0) as usize;

        let mut components: Vec<Component> =
            (0..label_count).map(|_| Component::default()).collect();
        for (x, y, label) in labels.enumerate_pixels() {
            let label = label[0] as usize;
            if label > 0 {
                components[label - 1].push(x, y, text[[y as usize, x as usize]]);
            }
        }

        let mut regions = Vec::new();
        for (idx, component) in components.iter().enumerate() {
            if component.pixels.len() < self.min_component_size {
                continue;
            }
            if component.peak_text < thresholds.text_threshold {
                continue;
            }

            // Pixels only reached through the link map do not belong to the word body
            let body: Vec<(u32, u32)> = component
                .pixels
                .iter()
                .copied()
                .filter(|&(x, y)| {
                    let (x, y) = (x as usize, y as usize);
                    !(link_mask(x, y) && !text_mask(x, y))
                })
                .collect();
            if body.is_empty() {
                continue;
            }

            let points = if thresholds.expand_components {
                self.expand(component, &body, width as u32, height as u32)
            } else {
                body.iter()
                    .map(|&(x, y)| Point::new(x as f32, y as f32))
                    .collect()
            };

            let region = self.fit_region(&points);
            tracing::debug!(
                label = idx + 1,
                size = component.pixels.len(),
                peak = component.peak_text,
                key = %region.key(),
                "kept text component"
            );
            regions.push(region);
        }

        regions
    }

    /// Dilates the component body inside its padded bounding window.
    ///
    /// The dilation window is `1 + niter` pixels wide where
    /// `niter = sqrt(size * min(w, h) / (w * h)) * 2`.
    fn expand(
        &self,
        component: &Component,
        body: &[(u32, u32)],
        map_width: u32,
        map_height: u32,
    ) -> Vec<Point> {
        let (w, h) = (component.width() as f32, component.height() as f32);
        let size = component.pixels.len() as f32;
        let niter = ((size * w.min(h) / (w * h)).sqrt() * 2.0) as u32;

        let sx = component.min_x.saturating_sub(niter);
        let sy = component.min_y.saturating_sub(niter);
        let ex = (component.max_x + niter + 2).min(map_width);
        let ey = (component.max_y + niter + 2).min(map_height);

        let mut window = GrayImage::new(ex - sx, ey - sy);
        for &(x, y) in body {
            window.put_pixel(x - sx, y - sy, Luma([255]));
        }

        let radius = niter.div_ceil(2).min(u8::MAX as u32) as u8;
        let grown = if radius > 0 {
            morphology::dilate(&window, Norm::LInf, radius)
        } else {
            window
        };

        grown
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] > 0)
            .map(|(x, y, _)| Point::new((x + sx) as f32, (y + sy) as f32))
            .collect()
    }

    /// Fits a quadrilateral to a component's pixels.
    fn fit_region(&self, points: &[Point]) -> Region {
        let rect = MinAreaRect::from_points(points);
        let corners = rect.box_points();

        let w = corners[0].distance(&corners[1]);
        let h = corners[1].distance(&corners[2]);
        let ratio = w.max(h) / (w.min(h) + 1e-5);

        if (1.0 - ratio).abs() <= self.diamond_tolerance {
            let l = points.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
            let r = points.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
            let t = points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
            let b = points.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
            return Region::Quad([
                Point::new(l, t),
                Point::new(r, t),
                Point::new(r, b),
                Point::new(l, b),
            ]);
        }

        Region::Quad(corners)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn fill(
        map: &mut Array2<f32>,
        rows: std::ops::Range<usize>,
        cols: std::ops::Range<usize>,
        v: f32,
    ) {
        for y in rows {
            for x in cols.clone() {
                map[[y, x]] = v;
            }
        }
    }

    #[test]
    fn test_single_component_yields_tight_quad() {
        let mut text = Array2::<f32>::zeros((25, 50));
        fill(&mut text, 10..15, 10..40, 0.9);
        let link = Array2::<f32>::zeros((25, 50));

        let thresholds = DetectionThresholds {
            expand_components: false,
            ..Default::default()
        };
        let regions = CraftPostProcess::new().extract(&text.view(), &link.view(), &thresholds);

        assert_eq!(regions.len(), 1);
        let (x1, y1, x2, y2) = regions[0].bounds();
        assert!((x1 - 10.0).abs() < 1e-3 && (x2 - 39.0).abs() < 1e-3);
        assert!((y1 - 10.0).abs() < 1e-3 && (y2 - 14.0).abs() < 1e-3);
    }

    #[test]
    fn test_low_peak_and_tiny_components_are_dropped() {
        let mut text = Array2::<f32>::zeros((30, 30));
        // Large but weak
        fill(&mut text, 2..8, 2..20, 0.5);
        // Strong but tiny
        fill(&mut text, 20..22, 20..22, 0.95);
        let link = Array2::<f32>::zeros((30, 30));

        let regions = CraftPostProcess::new().extract(
            &text.view(),
            &link.view(),
            &DetectionThresholds::default(),
        );
        assert!(regions.is_empty());
    }

    #[test]
    fn test_link_map_joins_characters() {
        let mut text = Array2::<f32>::zeros((20, 60));
        fill(&mut text, 5..12, 5..15, 0.9);
        fill(&mut text, 5..12, 25..35, 0.9);
        let mut link = Array2::<f32>::zeros((20, 60));
        fill(&mut link, 7..10, 15..25, 0.8);

        let thresholds = DetectionThresholds {
            expand_components: false,
            ..Default::default()
        };
        let regions = CraftPostProcess::new().extract(&text.view(), &link.view(), &thresholds);
        assert_eq!(regions.len(), 1);

        // Without the link both characters stand alone
        let empty_link = Array2::<f32>::zeros((20, 60));
        let split = CraftPostProcess::new().extract(&text.view(), &empty_link.view(), &thresholds);
        assert_eq!(split.len(), 2);
    }

    #[test]
    fn test_square_component_falls_back_to_axis_aligned_box() {
        let mut text = Array2::<f32>::zeros((40, 40));
        fill(&mut text, 10..20, 10..20, 0.9);
        let link = Array2::<f32>::zeros((40, 40));

        let thresholds = DetectionThresholds {
            expand_components: false,
            ..Default::default()
        };
        let regions = CraftPostProcess::new().extract(&text.view(), &link.view(), &thresholds);
        assert_eq!(regions.len(), 1);
        assert_eq!(
            regions[0],
            Region::Quad([
                Point::new(10.0, 10.0),
                Point::new(19.0, 10.0),
                Point::new(19.0, 19.0),
                Point::new(10.0, 19.0),
            ])
        );
    }

    #[test]
    fn test_expansion_grows_region_within_map() {
        let mut text = Array2::<f32>::zeros((20, 40));
        fill(&mut text, 8..12, 5..35, 0.9);
        let link = Array2::<f32>::zeros((20, 40));

        let tight = CraftPostProcess::new().extract(
            &text.view(),
            &link.view(),
            &DetectionThresholds {
                expand_components: false,
                ..Default::default()
            },
        );
        let grown = CraftPostProcess::new().extract(
            &text.view(),
            &link.view(),
            &DetectionThresholds::default(),
        );

        let (tx1, ty1, tx2, ty2) = tight[0].bounds();
        let (gx1, gy1, gx2, gy2) = grown[0].bounds();
        assert!(gx1 < tx1 && gy1 < ty1 && gx2 > tx2 && gy2 > ty2);
        assert!(gx1 >= 0.0 && gy1 >= 0.0 && gx2 <= 39.0 && gy2 <= 19.0);
    }

    #[test]
    fn test_blank_maps_yield_nothing() {
        let text = Array2::<f32>::zeros((16, 16));
        let regions = CraftPostProcess::new().extract(
            &text.view(),
            &text.view(),
            &DetectionThresholds::default(),
        );
        assert!(regions.is_empty());
    }
}
