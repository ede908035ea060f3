//! OCR orchestration.
//!
//! [`OcrPipeline`] wires detection, region extraction and recognition
//! together. Three entry points are provided:
//!
//! - [`OcrPipeline::ocr`] reads every detected region of one image,
//! - [`OcrPipeline::ocr_batch`] does the same for several images with one
//!   detector call,
//! - [`OcrPipeline::ocr_with_split`] first cuts the image into line bands
//!   (and optionally words) along minima of the detector score map, then
//!   reads every tile separately.

use std::path::{Path, PathBuf};

use image::{RgbImage, imageops};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::OCRError;
use crate::core::config::ConfigValidator;
use crate::pipeline::config::OcrConfig;
use crate::pipeline::context::OcrContext;
use crate::pipeline::refine::{RefineParams, refine};
use crate::pipeline::result::{Geometry, OutputRecord};
use crate::processors::geometry::Region;
use crate::processors::segmentation::{CutLineSet, SegmentAxis, segment_image};
use crate::utils::load_image;
use crate::utils::region_crop::{KeyedCrops, RegionCrop};

/// Pipeline input, resolved to pixels once at the boundary.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// An image file on disk.
    Path(PathBuf),
    /// An already decoded image.
    InMemory(RgbImage),
}

impl ImageSource {
    /// Loads or unwraps the image.
    pub fn into_image(self) -> Result<RgbImage, OCRError> {
        match self {
            ImageSource::Path(path) => load_image(&path),
            ImageSource::InMemory(image) => Ok(image),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::Path(path.to_path_buf())
    }
}

impl From<&str> for ImageSource {
    fn from(path: &str) -> Self {
        ImageSource::Path(PathBuf::from(path))
    }
}

impl From<RgbImage> for ImageSource {
    fn from(image: RgbImage) -> Self {
        ImageSource::InMemory(image)
    }
}

/// A sub-image read during split-aware OCR, in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitTile {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Result of [`OcrPipeline::ocr_with_split`].
#[derive(Debug, Clone)]
pub struct SplitOcrOutput {
    /// Records of every tile, translated into image coordinates.
    pub records: Vec<OutputRecord>,
    /// Horizontal cut lines in image rows.
    pub horizontal_cuts: CutLineSet,
    /// Vertical cut lines in image columns, one set per line band.
    pub vertical_cuts: Vec<CutLineSet>,
    /// The tiles that were read, band by band.
    pub tiles: Vec<SplitTile>,
}

/// The OCR pipeline.
#[derive(Debug, Clone)]
pub struct OcrPipeline {
    config: OcrConfig,
}

impl OcrPipeline {
    /// Creates a pipeline after validating `config`.
    pub fn new(config: OcrConfig) -> Result<Self, OCRError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in effect.
    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    /// Detects and reads every text region of one image.
    ///
    /// Records follow detection order. Regions that cannot be cropped are
    /// skipped; detector and recognizer failures are returned.
    pub fn ocr(
        &self,
        ctx: &OcrContext,
        input: impl Into<ImageSource>,
    ) -> Result<Vec<OutputRecord>, OCRError> {
        let image = input.into().into_image()?;
        self.ocr_image(ctx, &image)
    }

    /// [`ocr`](Self::ocr) on a decoded image.
    pub fn ocr_image(
        &self,
        ctx: &OcrContext,
        image: &RgbImage,
    ) -> Result<Vec<OutputRecord>, OCRError> {
        let detection = ctx.detector().detect(image)?;
        self.read_regions(ctx, image, &detection.regions)
    }

    /// Reads several images, running the detector once over all of them.
    pub fn ocr_batch(
        &self,
        ctx: &OcrContext,
        inputs: Vec<ImageSource>,
    ) -> Result<Vec<Vec<OutputRecord>>, OCRError> {
        let images = inputs
            .into_iter()
            .map(ImageSource::into_image)
            .collect::<Result<Vec<_>, _>>()?;
        let detections = ctx.detector().detect_batch(&images)?;

        images
            .iter()
            .zip(&detections)
            .map(|(image, detection)| self.read_regions(ctx, image, &detection.regions))
            .collect()
    }

    /// Splits the image along score-map minima and reads every tile.
    ///
    /// Detection runs once on the whole image to find the horizontal cut
    /// lines between text lines. With `split_vertically` each line band is
    /// further cut between words using that band's scores. Each tile is then
    /// read with [`ocr_image`](Self::ocr_image); a tile that fails yields no
    /// records and does not affect its siblings.
    pub fn ocr_with_split(
        &self,
        ctx: &OcrContext,
        input: impl Into<ImageSource>,
    ) -> Result<SplitOcrOutput, OCRError> {
        let image = input.into().into_image()?;
        let (width, height) = image.dimensions();
        let detection = ctx.detector().detect(&image)?;
        let score_map = &detection.score_map;
        let split = &self.config.split;

        let horizontal_cuts = segment_image(
            score_map,
            SegmentAxis::Horizontal,
            Some(split.max_horizontal_cuts),
            height as usize,
        );

        let mut records = Vec::new();
        let mut vertical_cuts = Vec::new();
        let mut tiles = Vec::new();

        for rows in horizontal_cuts.segments() {
            let columns = if split.split_vertically {
                let start = (rows.start as f32 / score_map.scale) as usize;
                let end = (rows.end as f32 / score_map.scale).ceil() as usize;
                let band = score_map.band(start..end.max(start + 1));
                segment_image(
                    &band,
                    SegmentAxis::Vertical,
                    Some(split.max_vertical_cuts),
                    width as usize,
                )
            } else {
                CutLineSet::full(width as usize)
            };

            for cols in columns.segments() {
                let tile = SplitTile {
                    x: cols.start as u32,
                    y: rows.start as u32,
                    width: cols.len() as u32,
                    height: rows.len() as u32,
                };
                let sub_image =
                    imageops::crop_imm(&image, tile.x, tile.y, tile.width, tile.height).to_image();

                match self.ocr_image(ctx, &sub_image) {
                    Ok(tile_records) => {
                        records.extend(tile_records.into_iter().map(|mut record| {
                            record.geometry =
                                record.geometry.translated(tile.x as i32, tile.y as i32);
                            record
                        }));
                    }
                    Err(err) => warn!(
                        x = tile.x,
                        y = tile.y,
                        width = tile.width,
                        height = tile.height,
                        error = %err,
                        "skipping tile after OCR failure"
                    ),
                }
                tiles.push(tile);
            }
            vertical_cuts.push(columns);
        }

        info!(
            bands = vertical_cuts.len(),
            tiles = tiles.len(),
            records = records.len(),
            "split OCR finished"
        );

        Ok(SplitOcrOutput {
            records,
            horizontal_cuts,
            vertical_cuts,
            tiles,
        })
    }

    /// Re-reads low-confidence records of `image` slice by slice.
    ///
    /// See [`refine`] for the rules.
    pub fn refine(
        &self,
        ctx: &OcrContext,
        image: &RgbImage,
        records: Vec<OutputRecord>,
    ) -> Result<Vec<OutputRecord>, OCRError> {
        refine(ctx, image, records, &RefineParams::from(&self.config.refine))
    }

    /// Crops, recognizes and assembles records for `regions`.
    fn read_regions(
        &self,
        ctx: &OcrContext,
        image: &RgbImage,
        regions: &[Region],
    ) -> Result<Vec<OutputRecord>, OCRError> {
        let mut crops = KeyedCrops::new();
        let kept = RegionCrop::crop_all(image, regions, &mut crops);
        if crops.is_empty() {
            debug!(regions = regions.len(), "no readable regions");
            return Ok(Vec::new());
        }

        let results = ctx.recognizer().recognize(&crops)?;
        Ok(kept
            .iter()
            .map(|(key, region)| {
                let result = results.get(key).cloned().unwrap_or_default();
                OutputRecord::new(
                    result.text,
                    result.confidence,
                    Geometry::from_region(region, self.config.box_type),
                )
                .with_padding(RegionCrop::padding(region, self.config.padding_ratio))
            })
            .collect())
    }
}
