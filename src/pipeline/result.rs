//! Output records produced by the pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pipeline::config::BoxRepresentation;
use crate::processors::geometry::{Point, Region};

/// Integer geometry of a recognized region, clamped to be non-negative.
///
/// Serialized flat: `x1, y1, x2, y2` for rectangles and `x1..y4` for
/// polygons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Geometry {
    /// Four corners, top-left first, clockwise.
    Quad {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        x3: i32,
        y3: i32,
        x4: i32,
        y4: i32,
    },
    /// Bounding rectangle with `x1 <= x2` and `y1 <= y2`.
    Rect { x1: i32, y1: i32, x2: i32, y2: i32 },
}

#[inline]
fn clamp_coord(v: f32) -> i32 {
    (v as i32).max(0)
}

impl Geometry {
    /// Converts a region into the requested representation.
    pub fn from_region(region: &Region, representation: BoxRepresentation) -> Self {
        match representation {
            BoxRepresentation::Rectangle => {
                let (min_x, min_y, max_x, max_y) = region.bounds();
                Geometry::Rect {
                    x1: clamp_coord(min_x),
                    y1: clamp_coord(min_y),
                    x2: clamp_coord(max_x),
                    y2: clamp_coord(max_y),
                }
            }
            BoxRepresentation::Polygon => {
                let [p1, p2, p3, p4] = region.corners();
                Geometry::Quad {
                    x1: clamp_coord(p1.x),
                    y1: clamp_coord(p1.y),
                    x2: clamp_coord(p2.x),
                    y2: clamp_coord(p2.y),
                    x3: clamp_coord(p3.x),
                    y3: clamp_coord(p3.y),
                    x4: clamp_coord(p4.x),
                    y4: clamp_coord(p4.y),
                }
            }
        }
    }

    /// The geometry as a region, for re-extracting its crop.
    pub fn to_region(&self) -> Region {
        match *self {
            Geometry::Quad {
                x1,
                y1,
                x2,
                y2,
                x3,
                y3,
                x4,
                y4,
            } => Region::Quad([
                Point::new(x1 as f32, y1 as f32),
                Point::new(x2 as f32, y2 as f32),
                Point::new(x3 as f32, y3 as f32),
                Point::new(x4 as f32, y4 as f32),
            ]),
            Geometry::Rect { x1, y1, x2, y2 } => {
                Region::rect(x1 as f32, y1 as f32, x2 as f32, y2 as f32)
            }
        }
    }

    /// Shifts every coordinate by `(dx, dy)`.
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        match *self {
            Geometry::Quad {
                x1,
                y1,
                x2,
                y2,
                x3,
                y3,
                x4,
                y4,
            } => Geometry::Quad {
                x1: x1 + dx,
                y1: y1 + dy,
                x2: x2 + dx,
                y2: y2 + dy,
                x3: x3 + dx,
                y3: y3 + dy,
                x4: x4 + dx,
                y4: y4 + dy,
            },
            Geometry::Rect { x1, y1, x2, y2 } => Geometry::Rect {
                x1: x1 + dx,
                y1: y1 + dy,
                x2: x2 + dx,
                y2: y2 + dy,
            },
        }
    }
}

/// One recognized text region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    /// Recognized text, possibly empty.
    pub text: String,
    /// Recognition confidence in `[0, 1]`.
    pub confidence: f32,
    /// Where the text was found.
    #[serde(flatten)]
    pub geometry: Geometry,
    /// Suggested padding around the region, when a padding ratio is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<u32>,
}

impl OutputRecord {
    /// Creates a record without padding.
    pub fn new(text: impl Into<String>, confidence: f32, geometry: Geometry) -> Self {
        Self {
            text: text.into(),
            confidence,
            geometry,
            padding: None,
        }
    }

    /// Sets the advisory padding.
    pub fn with_padding(mut self, padding: Option<u32>) -> Self {
        self.padding = padding;
        self
    }
}

impl fmt::Display for OutputRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.geometry {
            Geometry::Rect { x1, y1, x2, y2 } => write!(
                f,
                "[{x1}, {y1}, {x2}, {y2}] {:?} ({:.3})",
                self.text, self.confidence
            ),
            Geometry::Quad {
                x1, y1, x3, y3, ..
            } => write!(
                f,
                "<{x1}, {y1} .. {x3}, {y3}> {:?} ({:.3})",
                self.text, self.confidence
            ),
        }
    }
}
