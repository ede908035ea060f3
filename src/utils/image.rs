//! Image loading and pixel-level helpers.

use std::path::Path;

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::morphology::{self, Mask};

use crate::core::OCRError;

/// Loads an image from disk and converts it to RGB.
///
/// # Errors
///
/// Returns `OCRError::ImageLoad` when the file cannot be opened or decoded.
pub fn load_image(path: &Path) -> Result<RgbImage, OCRError> {
    let img = image::open(path).map_err(OCRError::ImageLoad)?;
    Ok(img.to_rgb8())
}

/// Largest supported dilation kernel side.
pub const MAX_KERNEL_SIZE: u32 = 511;

/// Grayscale dilation of every channel with a `kernel_size x kernel_size`
/// square, anchored at the kernel centre.
///
/// Each output value is the channel maximum over the window, clipped at the
/// image border. A kernel size of 0 or 1 returns a copy; sizes above
/// [`MAX_KERNEL_SIZE`] are clamped.
pub fn dilate_channels(image: &RgbImage, kernel_size: u32) -> RgbImage {
    if kernel_size <= 1 {
        return image.clone();
    }
    let mask = square_mask(kernel_size.min(MAX_KERNEL_SIZE));
    let (width, height) = image.dimensions();

    let dilated: Vec<GrayImage> = (0..3)
        .map(|c| {
            let channel =
                GrayImage::from_fn(width, height, |x, y| Luma([image.get_pixel(x, y)[c]]));
            morphology::grayscale_dilate(&channel, &mask)
        })
        .collect();

    RgbImage::from_fn(width, height, |x, y| {
        Rgb([0, 1, 2].map(|c| dilated[c].get_pixel(x, y)[0]))
    })
}

/// Square structuring element centred at `kernel_size / 2`.
fn square_mask(kernel_size: u32) -> Mask {
    let center = (kernel_size / 2) as u8;
    let footprint = GrayImage::from_pixel(kernel_size, kernel_size, Luma([255]));
    Mask::from_image(&footprint, center, center)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dilate_spreads_bright_pixel() {
        let mut img = RgbImage::new(7, 7);
        img.put_pixel(3, 3, Rgb([200, 100, 50]));
        let out = dilate_channels(&img, 3);
        assert_eq!(*out.get_pixel(2, 2), Rgb([200, 100, 50]));
        assert_eq!(*out.get_pixel(4, 4), Rgb([200, 100, 50]));
        assert_eq!(*out.get_pixel(1, 3), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_dilate_is_per_channel() {
        let mut img = RgbImage::new(3, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(2, 0, Rgb([0, 0, 255]));
        let out = dilate_channels(&img, 3);
        assert_eq!(*out.get_pixel(1, 0), Rgb([255, 0, 255]));
    }

    #[test]
    fn test_even_kernel_widens_by_one() {
        let mut img = RgbImage::new(7, 7);
        img.put_pixel(3, 3, Rgb([255, 255, 255]));
        let out = dilate_channels(&img, 2);
        let lit = out.pixels().filter(|p| p[0] == 255).count();
        assert_eq!(lit, 4);
        assert_eq!(out.get_pixel(3, 3)[0], 255);
    }

    #[test]
    fn test_oversized_kernel_is_clamped() {
        let mut img = RgbImage::new(4, 4);
        img.put_pixel(0, 0, Rgb([9, 9, 9]));
        let out = dilate_channels(&img, 10_000);
        assert!(out.pixels().all(|p| *p == Rgb([9, 9, 9])));
    }

    #[test]
    fn test_unit_kernel_is_identity() {
        let img = RgbImage::from_fn(4, 4, |x, y| Rgb([(x * 10) as u8, (y * 10) as u8, 0]));
        assert_eq!(dilate_channels(&img, 1), img);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.png");
        assert!(matches!(load_image(&path), Err(OCRError::ImageLoad(_))));
    }

    #[test]
    fn test_load_round_trip_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        let img = RgbImage::from_pixel(5, 3, Rgb([10, 20, 30]));
        img.save(&path).unwrap();
        let loaded = load_image(&path).unwrap();
        assert_eq!(loaded, img);
    }
}
