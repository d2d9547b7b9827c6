//! Region extraction and validation.
//!
//! Every detector reports geometry in its own shape (OCR polygons, model boxes,
//! contour bounding rectangles). This module turns that raw geometry into a
//! canonical `Region` that is guaranteed to lie inside the frame with positive area.
//! Malformed input yields `None`, never a panic.

use serde::{Deserialize, Serialize};

/// Padding applied around OCR text polygons.
pub const DEFAULT_PADDING: u32 = 10;

/// Number of corners expected in a text polygon.
pub const POLYGON_POINTS: usize = 4;

/// Frame dimensions used for clamping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameBounds {
    pub width: u32,
    pub height: u32,
}

impl FrameBounds {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Axis-aligned rectangle in frame pixel coordinates.
///
/// Invariant: `0 <= x1 < x2 <= width` and `0 <= y1 < y2 <= height` for the frame it
/// was extracted against. `x2`/`y2` are exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Region {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x1 && x < self.x2 && y >= self.y1 && y < self.y2
    }

    /// Clamp a tight box into the frame without padding or nudging.
    ///
    /// Returns `None` when a coordinate is not finite or the clamped box is empty.
    pub fn clamped(x1: f64, y1: f64, x2: f64, y2: f64, bounds: FrameBounds) -> Option<Self> {
        if bounds.is_empty() || ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return None;
        }
        let w = bounds.width as i64;
        let h = bounds.height as i64;
        let x1 = (x1 as i64).max(0);
        let y1 = (y1 as i64).max(0);
        let x2 = (x2 as i64).min(w);
        let y2 = (y2 as i64).min(h);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Self {
            x1: x1 as u32,
            y1: y1 as u32,
            x2: x2 as u32,
            y2: y2 as u32,
        })
    }

    /// Clip an already-integral rectangle to the frame. Used when a region computed
    /// for one frame size is applied to another.
    pub fn clip_to(&self, bounds: FrameBounds) -> Option<Self> {
        let x2 = self.x2.min(bounds.width);
        let y2 = self.y2.min(bounds.height);
        if x2 <= self.x1 || y2 <= self.y1 {
            return None;
        }
        Some(Self {
            x1: self.x1,
            y1: self.y1,
            x2,
            y2,
        })
    }
}

/// Geometry as reported by a detector, before validation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawGeometry {
    /// Polygon corners as `[x, y]` pairs. Arity is checked, not assumed.
    Polygon(Vec<Vec<f64>>),
    /// Corner box `[x1, y1, x2, y2]`.
    Box([f64; 4]),
}

impl RawGeometry {
    /// Axis-aligned quad from a pixel rectangle, as OCR engines report word boxes.
    pub fn quad(left: f64, top: f64, width: f64, height: f64) -> Self {
        let right = left + width;
        let bottom = top + height;
        RawGeometry::Polygon(vec![
            vec![left, top],
            vec![right, top],
            vec![right, bottom],
            vec![left, bottom],
        ])
    }

    /// Min/max extent over all points, or `None` for malformed geometry.
    fn extent(&self) -> Option<(f64, f64, f64, f64)> {
        let points: Vec<(f64, f64)> = match self {
            RawGeometry::Polygon(points) => {
                if points.len() != POLYGON_POINTS {
                    return None;
                }
                points
                    .iter()
                    .map(|point| match point.as_slice() {
                        [x, y] if x.is_finite() && y.is_finite() => Some((*x, *y)),
                        _ => None,
                    })
                    .collect::<Option<Vec<_>>>()?
            }
            RawGeometry::Box([x1, y1, x2, y2]) => {
                if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
                    return None;
                }
                vec![(*x1, *y1), (*x2, *y2)]
            }
        };

        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (x, y) in points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some((min_x, min_y, max_x, max_y))
    }
}

/// Convert raw detector geometry into a padded, frame-clamped `Region`.
///
/// Steps: min/max over the points, truncate to integers, clamp the minimum into
/// `[0, width - 1]` and the maximum into `(min, width]`, then grow by `padding` on
/// every side and clamp again.
pub fn extract(raw: Option<&RawGeometry>, bounds: FrameBounds, padding: u32) -> Option<Region> {
    let raw = raw?;
    if bounds.is_empty() {
        return None;
    }
    let (min_x, min_y, max_x, max_y) = raw.extent()?;

    let w = bounds.width as i64;
    let h = bounds.height as i64;
    let pad = padding as i64;

    let x1 = (min_x as i64).clamp(0, w - 1);
    let y1 = (min_y as i64).clamp(0, h - 1);
    let x2 = (max_x as i64).min(w).max(x1 + 1);
    let y2 = (max_y as i64).min(h).max(y1 + 1);

    let x1 = (x1 - pad).max(0);
    let y1 = (y1 - pad).max(0);
    let x2 = (x2 + pad).min(w);
    let y2 = (y2 + pad).min(h);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some(Region {
        x1: x1 as u32,
        y1: y1 as u32,
        x2: x2 as u32,
        y2: y2 as u32,
    })
}
