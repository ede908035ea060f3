//! Region extraction: turning detected geometry into recognizer-ready crops.
//!
//! Quadrilaterals are rectified with a perspective transform, rectangles are
//! copied directly. Crops are collected in a [`Keyed`] map whose keys are
//! derived from the region geometry and disambiguated on insert.

use std::collections::HashMap;

use image::{RgbImage, imageops};
use tracing::debug;

use crate::core::OCRError;
use crate::processors::decode::RecognitionResult;
use crate::processors::geometry::Region;
use crate::utils::transform::four_point_transform;

/// Insertion-ordered string-keyed collection.
///
/// Inserting a key that is already present appends `_1` until the key is
/// unique, so no entry is ever overwritten.
#[derive(Debug, Clone)]
pub struct Keyed<T> {
    entries: Vec<(String, T)>,
    positions: HashMap<String, usize>,
}

/// Crops keyed by region.
pub type KeyedCrops = Keyed<RgbImage>;

/// Recognition results keyed like the crops they were read from.
pub type KeyedResults = Keyed<RecognitionResult>;

impl<T> Default for Keyed<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<T> Keyed<T> {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value`, returning the key it was stored under.
    pub fn insert(&mut self, key: impl Into<String>, value: T) -> String {
        let mut key = key.into();
        while self.positions.contains_key(&key) {
            key.push_str("_1");
        }
        self.positions.insert(key.clone(), self.entries.len());
        self.entries.push((key.clone(), value));
        key
    }

    /// Looks up a value by key.
    pub fn get(&self, key: &str) -> Option<&T> {
        self.positions.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<T> IntoIterator for Keyed<T> {
    type Item = (String, T);
    type IntoIter = std::vec::IntoIter<(String, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<T> FromIterator<(String, T)> for Keyed<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        let mut keyed = Keyed::new();
        for (key, value) in iter {
            keyed.insert(key, value);
        }
        keyed
    }
}

/// Region based image cropping.
pub struct RegionCrop;

impl RegionCrop {
    /// Crops `region` out of `image`.
    ///
    /// Quadrilaterals are rectified to `max(top, bottom) x max(left, right)`.
    /// Rectangles are clamped to the image and copied.
    ///
    /// # Errors
    ///
    /// Returns `OCRError::RegionExtraction` carrying the region key when the
    /// geometry lies outside the image or collapses to zero area.
    pub fn crop(image: &RgbImage, region: &Region) -> Result<RgbImage, OCRError> {
        let (width, height) = image.dimensions();
        let (min_x, min_y, max_x, max_y) = region.bounds();
        if width == 0
            || height == 0
            || max_x < 0.0
            || max_y < 0.0
            || min_x >= width as f32
            || min_y >= height as f32
        {
            return Err(OCRError::region_extraction(
                region.key(),
                format!("region lies outside the {width}x{height} image"),
            ));
        }

        match region {
            Region::Quad(points) => four_point_transform(image, points)
                .map_err(|e| OCRError::region_extraction(region.key(), e.to_string())),
            Region::Rect { x1, y1, x2, y2 } => Self::crop_rect(image, region, *x1, *y1, *x2, *y2),
        }
    }

    fn crop_rect(
        image: &RgbImage,
        region: &Region,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    ) -> Result<RgbImage, OCRError> {
        let x1 = (x1.max(0.0) as u32).min(image.width() - 1);
        let y1 = (y1.max(0.0) as u32).min(image.height() - 1);
        let x2 = (x2.max(0.0) as u32).min(image.width());
        let y2 = (y2.max(0.0) as u32).min(image.height());

        if x2 <= x1 || y2 <= y1 {
            return Err(OCRError::region_extraction(
                region.key(),
                format!("empty crop ({x1}, {y1}) to ({x2}, {y2})"),
            ));
        }
        Ok(imageops::crop_imm(image, x1, y1, x2 - x1, y2 - y1).to_image())
    }

    /// Padding suggested for a region: its height divided by `padding_ratio`.
    ///
    /// The value is advisory and never applied to the geometry.
    pub fn padding(region: &Region, padding_ratio: Option<f32>) -> Option<u32> {
        padding_ratio
            .filter(|&ratio| ratio > 0.0)
            .map(|ratio| (region.height() / ratio) as u32)
    }

    /// Crops every region into `crops`, skipping the ones that fail.
    ///
    /// Returns the surviving regions with the keys their crops were stored
    /// under, in input order.
    pub fn crop_all(
        image: &RgbImage,
        regions: &[Region],
        crops: &mut KeyedCrops,
    ) -> Vec<(String, Region)> {
        let mut kept = Vec::with_capacity(regions.len());
        for region in regions {
            match Self::crop(image, region) {
                Ok(crop) => {
                    let key = crops.insert(region.key(), crop);
                    kept.push((key, *region));
                }
                Err(err) => debug!(error = %err, "skipping region"),
            }
        }
        kept
    }
}
