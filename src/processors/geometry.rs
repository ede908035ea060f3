//! Geometric primitives for detected text regions.
//!
//! This module provides the point and region types shared by detection,
//! cropping and the pipeline output, plus the convex hull and minimum area
//! rectangle routines used to turn a labelled component into a quadrilateral.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f32::consts::PI;

/// A 2D point with floating-point coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Point {
    /// X-coordinate of the point.
    pub x: f32,
    /// Y-coordinate of the point.
    pub y: f32,
}

impl Point {
    /// Creates a new point with the given coordinates.
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A detected or segmented text area.
///
/// Quadrilateral corners are ordered top-left, top-right, bottom-right,
/// bottom-left. Rectangles are axis-aligned with `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Region {
    /// Four corner points, possibly skewed.
    Quad([Point; 4]),
    /// Axis-aligned rectangle.
    Rect { x1: f32, y1: f32, x2: f32, y2: f32 },
}

impl Region {
    /// Creates an axis-aligned rectangle, normalizing the corner order.
    pub fn rect(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Region::Rect {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Returns the four corners ordered top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Point; 4] {
        match *self {
            Region::Quad(points) => points,
            Region::Rect { x1, y1, x2, y2 } => [
                Point::new(x1, y1),
                Point::new(x2, y1),
                Point::new(x2, y2),
                Point::new(x1, y2),
            ],
        }
    }

    /// Returns `(min_x, min_y, max_x, max_y)` over all corners.
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        let corners = self.corners();
        let (min_x, max_x) = corners
            .iter()
            .map(|p| p.x)
            .minmax_by(|a, b| a.total_cmp(b))
            .into_option()
            .unwrap_or((0.0, 0.0));
        let (min_y, max_y) = corners
            .iter()
            .map(|p| p.y)
            .minmax_by(|a, b| a.total_cmp(b))
            .into_option()
            .unwrap_or((0.0, 0.0));
        (min_x, min_y, max_x, max_y)
    }

    /// Height of the bounding rectangle.
    pub fn height(&self) -> f32 {
        let (_, min_y, _, max_y) = self.bounds();
        max_y - min_y
    }

    /// Stable string key built from the first and third corners.
    ///
    /// Coordinates are truncated to integers and clamped to be non-negative,
    /// giving `"{x1}-{y1}_{x3}-{y3}"`.
    pub fn key(&self) -> String {
        let corners = self.corners();
        let clamp = |v: f32| (v as i64).max(0);
        format!(
            "{}-{}_{}-{}",
            clamp(corners[0].x),
            clamp(corners[0].y),
            clamp(corners[2].x),
            clamp(corners[2].y)
        )
    }

    /// Returns the region with every coordinate multiplied by `factor`.
    pub fn scaled(&self, factor: f32) -> Self {
        self.map_points(|p| Point::new(p.x * factor, p.y * factor))
    }

    fn map_points(&self, f: impl Fn(Point) -> Point) -> Self {
        match *self {
            Region::Quad(points) => Region::Quad(points.map(f)),
            Region::Rect { x1, y1, x2, y2 } => {
                let a = f(Point::new(x1, y1));
                let b = f(Point::new(x2, y2));
                Region::rect(a.x, a.y, b.x, b.y)
            }
        }
    }
}

/// Computes the convex hull of a point set using Graham's scan.
///
/// Returns the input unchanged when it has fewer than 3 points.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut points = points.to_vec();

    // Lowest y, leftmost on ties
    let mut start_idx = 0;
    for i in 1..points.len() {
        if points[i].y < points[start_idx].y
            || (points[i].y == points[start_idx].y && points[i].x < points[start_idx].x)
        {
            start_idx = i;
        }
    }
    points.swap(0, start_idx);
    let start_point = points[0];

    points[1..].sort_by(|a, b| {
        let cross = cross_product(&start_point, a, b);
        if cross == 0.0 {
            let dist_a = (a.x - start_point.x).powi(2) + (a.y - start_point.y).powi(2);
            let dist_b = (b.x - start_point.x).powi(2) + (b.y - start_point.y).powi(2);
            dist_a.total_cmp(&dist_b)
        } else if cross > 0.0 {
            std::cmp::Ordering::Less
        } else {
            std::cmp::Ordering::Greater
        }
    });

    let mut hull: Vec<Point> = Vec::new();
    for point in points {
        while hull.len() > 1
            && cross_product(&hull[hull.len() - 2], &hull[hull.len() - 1], &point) <= 0.0
        {
            hull.pop();
        }
        hull.push(point);
    }

    hull
}

/// Cross product of `p1->p2` and `p1->p3`. Positive for a counter-clockwise turn.
fn cross_product(p1: &Point, p2: &Point, p3: &Point) -> f32 {
    (p2.x - p1.x) * (p3.y - p1.y) - (p2.y - p1.y) * (p3.x - p1.x)
}

/// A rectangle with minimum area that encloses a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinAreaRect {
    /// The center point of the rectangle.
    pub center: Point,
    /// Extent along the rectangle's own x-axis.
    pub width: f32,
    /// Extent along the rectangle's own y-axis.
    pub height: f32,
    /// The rotation angle of the rectangle in degrees.
    pub angle: f32,
}

impl MinAreaRect {
    /// Computes the minimum area rectangle enclosing `points`.
    ///
    /// Uses rotating calipers over the convex hull. Degenerate inputs (fewer
    /// than 3 hull points) fall back to the axis-aligned extent.
    pub fn from_points(points: &[Point]) -> Self {
        let hull = convex_hull(points);

        if hull.len() < 3 {
            return Self::axis_aligned(points);
        }

        let mut min_area = f32::MAX;
        let mut min_rect = Self::axis_aligned(points);

        let n = hull.len();
        for i in 0..n {
            let j = (i + 1) % n;

            let edge_x = hull[j].x - hull[i].x;
            let edge_y = hull[j].y - hull[i].y;
            let edge_length = (edge_x * edge_x + edge_y * edge_y).sqrt();

            if edge_length < f32::EPSILON {
                continue;
            }

            let nx = edge_x / edge_length;
            let ny = edge_y / edge_length;
            let px = -ny;
            let py = nx;

            let mut min_n = f32::MAX;
            let mut max_n = f32::MIN;
            let mut min_p = f32::MAX;
            let mut max_p = f32::MIN;

            for point in &hull {
                let proj_n = nx * (point.x - hull[i].x) + ny * (point.y - hull[i].y);
                min_n = min_n.min(proj_n);
                max_n = max_n.max(proj_n);

                let proj_p = px * (point.x - hull[i].x) + py * (point.y - hull[i].y);
                min_p = min_p.min(proj_p);
                max_p = max_p.max(proj_p);
            }

            let width = max_n - min_n;
            let height = max_p - min_p;
            let area = width * height;

            if area < min_area {
                min_area = area;

                let center_n = (min_n + max_n) / 2.0;
                let center_p = (min_p + max_p) / 2.0;

                min_rect = MinAreaRect {
                    center: Point::new(
                        hull[i].x + center_n * nx + center_p * px,
                        hull[i].y + center_n * ny + center_p * py,
                    ),
                    width,
                    height,
                    angle: f32::atan2(ny, nx) * 180.0 / PI,
                };
            }
        }

        min_rect
    }

    fn axis_aligned(points: &[Point]) -> Self {
        let (min_x, max_x) = points
            .iter()
            .map(|p| p.x)
            .minmax_by(|a, b| a.total_cmp(b))
            .into_option()
            .unwrap_or((0.0, 0.0));
        let (min_y, max_y) = points
            .iter()
            .map(|p| p.y)
            .minmax_by(|a, b| a.total_cmp(b))
            .into_option()
            .unwrap_or((0.0, 0.0));
        MinAreaRect {
            center: Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0),
            width: max_x - min_x,
            height: max_y - min_y,
            angle: 0.0,
        }
    }

    /// Gets the four corner points ordered top-left, top-right, bottom-right,
    /// bottom-left in image coordinates.
    pub fn box_points(&self) -> [Point; 4] {
        let cos_a = (self.angle * PI / 180.0).cos();
        let sin_a = (self.angle * PI / 180.0).sin();

        let w_2 = self.width / 2.0;
        let h_2 = self.height / 2.0;

        let mut points = [(-w_2, -h_2), (w_2, -h_2), (w_2, h_2), (-w_2, h_2)].map(|(x, y)| {
            Point::new(
                x * cos_a - y * sin_a + self.center.x,
                x * sin_a + y * cos_a + self.center.y,
            )
        });

        sort_box_points(&mut points);
        points
    }
}

/// Orders four points as top-left, top-right, bottom-right, bottom-left.
///
/// Points are classified by quadrant around the centroid; when two points
/// land in the same quadrant (thin or 45 degree boxes) the polar angle
/// ordering is used instead.
pub fn sort_box_points(points: &mut [Point; 4]) {
    let center_x = points.iter().map(|p| p.x).sum::<f32>() / 4.0;
    let center_y = points.iter().map(|p| p.y).sum::<f32>() / 4.0;

    let mut classified: Vec<(u8, Point)> = points
        .iter()
        .map(|point| {
            let corner = match (point.x < center_x, point.y < center_y) {
                (true, true) => 0,
                (false, true) => 1,
                (false, false) => 2,
                (true, false) => 3,
            };
            (corner, *point)
        })
        .collect();

    let distinct: HashSet<u8> = classified.iter().map(|(c, _)| *c).collect();
    if distinct.len() < 4 {
        sort_box_points_by_angle(points, center_x, center_y);
        return;
    }

    classified.sort_by_key(|&(corner, _)| corner);
    for (slot, (_, point)) in points.iter_mut().zip(classified) {
        *slot = point;
    }
}

fn sort_box_points_by_angle(points: &mut [Point; 4], center_x: f32, center_y: f32) {
    let mut with_angles: Vec<(f32, Point)> = points
        .iter()
        .map(|p| {
            let angle = f32::atan2(p.y - center_y, p.x - center_x);
            let normalized = if angle < -PI / 2.0 {
                angle + 2.0 * PI
            } else {
                angle
            };
            (normalized, *p)
        })
        .collect();

    with_angles.sort_by(|a, b| a.0.total_cmp(&b.0));

    // Start from the point nearest the top-left of the centroid
    let start_idx = with_angles
        .iter()
        .position_min_by(|(_, a), (_, b)| {
            let score_a = (a.x - center_x + 100.0).powi(2) + (a.y - center_y + 100.0).powi(2);
            let score_b = (b.x - center_x + 100.0).powi(2) + (b.y - center_y + 100.0).powi(2);
            score_a.total_cmp(&score_b)
        })
        .unwrap_or(0);

    for (i, point) in points.iter_mut().enumerate() {
        *point = with_angles[(start_idx + i) % 4].1;
    }
}
