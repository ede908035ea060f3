//! Perspective rectification of quadrilateral text regions.
//!
//! A skewed quadrilateral is mapped onto an axis-aligned rectangle whose width
//! is the longer of its top and bottom edges and whose height is the longer of
//! its left and right edges. Sampling is bicubic with border replication.

use crate::core::OCRError;
use crate::core::errors::ImageProcessError;
use crate::processors::geometry::{Point, sort_box_points};
use image::{Rgb, RgbImage};
use nalgebra::{Matrix3, Vector3};
use rayon::prelude::*;
use tracing::debug;

/// Output size of rectifying `quad`, as `(width, height)`.
///
/// The corners are expected in top-left, top-right, bottom-right, bottom-left
/// order.
pub fn rectified_size(quad: &[Point; 4]) -> (u32, u32) {
    let width = quad[0].distance(&quad[1]).max(quad[3].distance(&quad[2]));
    let height = quad[0].distance(&quad[3]).max(quad[1].distance(&quad[2]));
    (width.round() as u32, height.round() as u32)
}

/// Rectifies a quadrilateral region of `src_image`.
///
/// The corners are re-ordered top-left, top-right, bottom-right, bottom-left
/// before the transform is computed, so any winding is accepted.
///
/// # Errors
///
/// Returns an error if the quadrilateral collapses to zero width or height,
/// or if the perspective transform cannot be solved.
pub fn four_point_transform(src_image: &RgbImage, quad: &[Point; 4]) -> Result<RgbImage, OCRError> {
    if src_image.width() == 0 || src_image.height() == 0 {
        return Err(ImageProcessError::InvalidCropSize.into());
    }

    let mut ordered = *quad;
    sort_box_points(&mut ordered);

    let (width, height) = rectified_size(&ordered);
    if width == 0 || height == 0 {
        return Err(ImageProcessError::InvalidCropSize.into());
    }

    let target = [
        Point::new(0.0, 0.0),
        Point::new(width as f32, 0.0),
        Point::new(width as f32, height as f32),
        Point::new(0.0, height as f32),
    ];

    let transform = get_perspective_transform(&ordered, &target)?;
    debug!(width, height, "rectifying quadrilateral region");
    warp_perspective(src_image, &transform, width, height)
}

/// Calculates the perspective transformation matrix mapping `src_points`
/// onto `dst_points`.
///
/// Solves the 8x8 linear system of the projective mapping with LU
/// decomposition.
///
/// # Errors
///
/// Returns an error if the system is singular, e.g. for collinear corners.
pub fn get_perspective_transform(
    src_points: &[Point; 4],
    dst_points: &[Point; 4],
) -> Result<Matrix3<f32>, OCRError> {
    let mut a = nalgebra::DMatrix::<f32>::zeros(8, 8);
    let mut b = nalgebra::DVector::<f32>::zeros(8);

    for (i, (src, dst)) in src_points.iter().zip(dst_points).enumerate() {
        a.set_row(
            i * 2,
            &nalgebra::RowDVector::from_row_slice(&[
                src.x,
                src.y,
                1.0,
                0.0,
                0.0,
                0.0,
                -src.x * dst.x,
                -src.y * dst.x,
            ]),
        );
        b[i * 2] = dst.x;

        a.set_row(
            i * 2 + 1,
            &nalgebra::RowDVector::from_row_slice(&[
                0.0,
                0.0,
                0.0,
                src.x,
                src.y,
                1.0,
                -src.x * dst.y,
                -src.y * dst.y,
            ]),
        );
        b[i * 2 + 1] = dst.y;
    }

    let solution = a
        .lu()
        .solve(&b)
        .filter(|s| s.iter().all(|v| v.is_finite()))
        .ok_or(ImageProcessError::DegenerateTransform)?;

    Ok(Matrix3::new(
        solution[0],
        solution[1],
        solution[2],
        solution[3],
        solution[4],
        solution[5],
        solution[6],
        solution[7],
        1.0,
    ))
}

/// Warps `src_image` with `transform` into a `dst_width x dst_height` image.
///
/// Uses inverse mapping; rows are processed in parallel.
fn warp_perspective(
    src_image: &RgbImage,
    transform: &Matrix3<f32>,
    dst_width: u32,
    dst_height: u32,
) -> Result<RgbImage, OCRError> {
    let inv_matrix = transform
        .try_inverse()
        .ok_or(ImageProcessError::DegenerateTransform)?;

    let mut dst_image = RgbImage::new(dst_width, dst_height);
    let buffer: &mut [u8] = dst_image.as_mut();

    buffer
        .par_chunks_mut((dst_width * 3) as usize)
        .enumerate()
        .for_each(|(dst_y, row_buffer)| {
            for dst_x in 0..dst_width {
                let src_point = inv_matrix * Vector3::new(dst_x as f32, dst_y as f32, 1.0);
                let pixel = if src_point.z.abs() > f32::EPSILON {
                    bicubic_interpolate(
                        src_image,
                        src_point.x / src_point.z,
                        src_point.y / src_point.z,
                    )
                } else {
                    *src_image.get_pixel(0, 0)
                };
                let index = (dst_x * 3) as usize;
                row_buffer[index..index + 3].copy_from_slice(&pixel.0);
            }
        });

    Ok(dst_image)
}

/// Pixel lookup with border replication.
#[inline]
fn get_pixel_replicate(image: &RgbImage, x: i32, y: i32) -> Rgb<u8> {
    let clamped_x = x.clamp(0, image.width() as i32 - 1) as u32;
    let clamped_y = y.clamp(0, image.height() as i32 - 1) as u32;
    *image.get_pixel(clamped_x, clamped_y)
}

/// Catmull-Rom cubic convolution kernel (a = -0.5).
#[inline]
fn cubic_kernel(t: f32) -> f32 {
    const A: f32 = -0.5;
    let t_abs = t.abs();

    if t_abs <= 1.0 {
        (A + 2.0) * t_abs * t_abs * t_abs - (A + 3.0) * t_abs * t_abs + 1.0
    } else if t_abs < 2.0 {
        A * t_abs * t_abs * t_abs - 5.0 * A * t_abs * t_abs + 8.0 * A * t_abs - 4.0 * A
    } else {
        0.0
    }
}

/// Bicubic sample at fractional coordinates over a 4x4 neighbourhood.
fn bicubic_interpolate(image: &RgbImage, x: f32, y: f32) -> Rgb<u8> {
    let x_int = x.floor() as i32;
    let y_int = y.floor() as i32;
    let dx = x - x_int as f32;
    let dy = y - y_int as f32;

    let wx = [
        cubic_kernel(dx + 1.0),
        cubic_kernel(dx),
        cubic_kernel(dx - 1.0),
        cubic_kernel(dx - 2.0),
    ];
    let wy = [
        cubic_kernel(dy + 1.0),
        cubic_kernel(dy),
        cubic_kernel(dy - 1.0),
        cubic_kernel(dy - 2.0),
    ];

    let mut result = [0.0f32; 3];
    for (j, &weight_y) in wy.iter().enumerate() {
        let sample_y = y_int - 1 + j as i32;
        for (i, &weight_x) in wx.iter().enumerate() {
            let sample_x = x_int - 1 + i as i32;
            let weight = weight_x * weight_y;
            let pixel = get_pixel_replicate(image, sample_x, sample_y);
            for (c, result_c) in result.iter_mut().enumerate() {
                *result_c += weight * pixel.0[c] as f32;
            }
        }
    }

    Rgb(result.map(|v| v.round().clamp(0.0, 255.0) as u8))
}
