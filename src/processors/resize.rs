//! Image resizing for the detector and recognizer inputs.
//!
//! - [`CanvasResize`] scales an image so its long side fits a bounded canvas
//!   and reports the padded canvas size the detector expects.
//! - [`AlignResize`] brings a text crop to the recognizer's fixed geometry,
//!   either stretched or aspect-preserving with right padding.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Pixel, RgbImage};

use crate::core::OCRError;

/// Detector canvases are padded up to a multiple of this size.
pub const CANVAS_ALIGNMENT: u32 = 32;

/// Rounds `value` up to the next multiple of `multiple`.
pub fn round_up_to_multiple(value: u32, multiple: u32) -> u32 {
    value.div_ceil(multiple) * multiple
}

/// Result of fitting an image onto the detector canvas.
#[derive(Debug, Clone)]
pub struct ResizedImage {
    /// The resized image, without padding.
    pub image: RgbImage,
    /// Resized size divided by source size.
    pub ratio: f32,
    /// Canvas width after padding.
    pub padded_width: u32,
    /// Canvas height after padding.
    pub padded_height: u32,
}

/// Aspect-preserving resize onto a bounded canvas.
///
/// The long side becomes `mag_ratio * max(h, w)`, capped at `canvas_size`.
#[derive(Debug, Clone, Copy)]
pub struct CanvasResize {
    /// Upper bound for the long side of the resized image.
    pub canvas_size: u32,
    /// Magnification applied before capping.
    pub mag_ratio: f32,
}

impl CanvasResize {
    /// Creates a new canvas resizer.
    pub fn new(canvas_size: u32, mag_ratio: f32) -> Self {
        Self {
            canvas_size,
            mag_ratio,
        }
    }

    /// Resizes `img` bilinearly and computes the padded canvas size.
    ///
    /// # Errors
    ///
    /// Returns `OCRError::InvalidInput` for empty images.
    pub fn apply(&self, img: &RgbImage) -> Result<ResizedImage, OCRError> {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(OCRError::invalid_input(format!(
                "cannot resize an empty image ({}x{})",
                width, height
            )));
        }

        let long_side = width.max(height) as f32;
        let target = (self.mag_ratio * long_side).min(self.canvas_size as f32);
        let ratio = target / long_side;

        let target_w = ((width as f32 * ratio) as u32).max(1);
        let target_h = ((height as f32 * ratio) as u32).max(1);

        let image = if (target_w, target_h) == (width, height) {
            img.clone()
        } else {
            imageops::resize(img, target_w, target_h, FilterType::Triangle)
        };

        tracing::debug!(
            src_w = width,
            src_h = height,
            dst_w = target_w,
            dst_h = target_h,
            ratio,
            "resized image onto detector canvas"
        );

        Ok(ResizedImage {
            image,
            ratio,
            padded_width: round_up_to_multiple(target_w, CANVAS_ALIGNMENT),
            padded_height: round_up_to_multiple(target_h, CANVAS_ALIGNMENT),
        })
    }
}

/// Brings crops to the recognizer's `img_w x img_h` geometry.
#[derive(Debug, Clone, Copy)]
pub struct AlignResize {
    /// Target height.
    pub img_h: u32,
    /// Target width.
    pub img_w: u32,
    /// Keep the aspect ratio and pad on the right instead of stretching.
    pub keep_ratio_with_pad: bool,
}

impl AlignResize {
    /// Creates a new resizer.
    pub fn new(img_h: u32, img_w: u32, keep_ratio_with_pad: bool) -> Self {
        Self {
            img_h,
            img_w,
            keep_ratio_with_pad,
        }
    }

    /// Width the content occupies after resizing, before any padding.
    pub fn content_width(&self, width: u32, height: u32) -> u32 {
        if !self.keep_ratio_with_pad || height == 0 {
            return self.img_w;
        }
        let ratio = width as f32 / height as f32;
        ((self.img_h as f32 * ratio).ceil() as u32).clamp(1, self.img_w)
    }

    /// Resizes with bicubic sampling.
    ///
    /// With `keep_ratio_with_pad` the content keeps its aspect ratio and the
    /// columns right of it repeat the last content column.
    pub fn apply<P>(
        &self,
        img: &ImageBuffer<P, Vec<P::Subpixel>>,
    ) -> ImageBuffer<P, Vec<P::Subpixel>>
    where
        P: Pixel + 'static,
        P::Subpixel: 'static,
    {
        let (width, height) = img.dimensions();
        let content_w = self.content_width(width, height);
        let resized = imageops::resize(img, content_w, self.img_h, FilterType::CatmullRom);
        if content_w == self.img_w {
            return resized;
        }

        ImageBuffer::from_fn(self.img_w, self.img_h, |x, y| {
            *resized.get_pixel(x.min(content_w - 1), y)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb};

    #[test]
    fn test_round_up_to_multiple() {
        assert_eq!(round_up_to_multiple(100, 32), 128);
        assert_eq!(round_up_to_multiple(64, 32), 64);
        assert_eq!(round_up_to_multiple(1, 32), 32);
    }

    #[test]
    fn test_canvas_resize_keeps_size_at_unit_magnification() {
        let img = RgbImage::from_pixel(100, 50, Rgb([255, 255, 255]));
        let resized = CanvasResize::new(2560, 1.0).apply(&img).unwrap();
        assert_eq!(resized.ratio, 1.0);
        assert_eq!(resized.image.dimensions(), (100, 50));
        assert_eq!((resized.padded_width, resized.padded_height), (128, 64));
    }

    #[test]
    fn test_canvas_resize_caps_long_side() {
        let img = RgbImage::new(400, 200);
        let resized = CanvasResize::new(100, 1.5).apply(&img).unwrap();
        assert!((resized.ratio - 0.25).abs() < 1e-6);
        assert_eq!(resized.image.dimensions(), (100, 50));
        assert_eq!((resized.padded_width, resized.padded_height), (128, 64));
    }

    #[test]
    fn test_canvas_resize_magnifies() {
        let img = RgbImage::new(60, 30);
        let resized = CanvasResize::new(2560, 2.0).apply(&img).unwrap();
        assert_eq!(resized.image.dimensions(), (120, 60));
        assert_eq!(resized.ratio, 2.0);
    }

    #[test]
    fn test_canvas_resize_rejects_empty_image() {
        let img = RgbImage::new(0, 10);
        assert!(CanvasResize::new(2560, 1.0).apply(&img).is_err());
    }

    #[test]
    fn test_align_resize_stretches_by_default() {
        let img = GrayImage::from_pixel(30, 10, Luma([7]));
        let out = AlignResize::new(32, 100, false).apply(&img);
        assert_eq!(out.dimensions(), (100, 32));
    }

    #[test]
    fn test_align_resize_pads_with_last_column() {
        let img = GrayImage::from_fn(20, 10, |x, _| if x < 10 { Luma([0]) } else { Luma([200]) });
        let resizer = AlignResize::new(32, 100, true);
        assert_eq!(resizer.content_width(20, 10), 64);

        let out = resizer.apply(&img);
        assert_eq!(out.dimensions(), (100, 32));
        let last_content = out.get_pixel(63, 16)[0];
        assert_eq!(out.get_pixel(64, 16)[0], last_content);
        assert_eq!(out.get_pixel(99, 0)[0], out.get_pixel(63, 0)[0]);
    }

    #[test]
    fn test_align_resize_wide_crop_fills_width() {
        let resizer = AlignResize::new(32, 100, true);
        assert_eq!(resizer.content_width(1000, 10), 100);
    }
}
