//! Street sign segmentation by color and shape. No model involved.
//!
//! Pipeline: HSV conversion (OpenCV 8-bit scale, hue in `[0, 180)`), hue/sat/value
//! band mask, morphological closing, outer contours, then area and aspect ratio
//! filters on each contour's bounding box.

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::distance_transform::Norm;
use imageproc::morphology;

use crate::frame::Frame;
use crate::region::Region;

use super::error::DetectionError;

/// Inclusive HSV band for green street name plates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| hsv[i] >= self.lower[i] && hsv[i] <= self.upper[i])
    }
}

pub const GREEN_SIGN_RANGE: HsvRange = HsvRange {
    lower: [40, 60, 60],
    upper: [80, 255, 200],
};

#[derive(Clone, Debug, PartialEq)]
pub struct SignSegmenterConfig {
    pub range: HsvRange,
    /// Chebyshev radius of the closing element (3 gives a 7x7 square).
    pub closing_radius: u8,
    /// Exclusive contour area band, in pixels.
    pub min_area: f64,
    pub max_area: f64,
    /// Exclusive width/height band.
    pub min_aspect: f64,
    pub max_aspect: f64,
    pub max_regions: usize,
}

impl Default for SignSegmenterConfig {
    fn default() -> Self {
        Self {
            range: GREEN_SIGN_RANGE,
            closing_radius: 3,
            min_area: 800.0,
            max_area: 25_000.0,
            min_aspect: 1.5,
            max_aspect: 6.5,
            max_regions: 3,
        }
    }
}

/// Color/contour street sign detector.
#[derive(Clone, Debug, Default)]
pub struct SignSegmenter {
    config: SignSegmenterConfig,
}

impl SignSegmenter {
    pub fn new(config: SignSegmenterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SignSegmenterConfig {
        &self.config
    }

    /// Candidate sign regions, capped at `max_regions`.
    pub fn detect_signs(&self, frame: &Frame) -> Result<Vec<Region>, DetectionError> {
        let mut regions = segment(frame, &self.config);
        regions.truncate(self.config.max_regions);
        Ok(regions)
    }
}

/// All regions passing the color and shape filters, in contour order.
pub fn segment(frame: &Frame, config: &SignSegmenterConfig) -> Vec<Region> {
    let mask = color_mask(frame, &config.range);
    let closed = morphology::close(&mask, Norm::LInf, config.closing_radius);
    let bounds = frame.bounds();

    find_contours::<i32>(&closed)
        .iter()
        .filter(|contour| {
            matches!(contour.border_type, BorderType::Outer) && contour.parent.is_none()
        })
        .filter_map(|contour| {
            let area = contour_area(contour);
            if area <= config.min_area || area >= config.max_area {
                return None;
            }
            let (x, y, w, h) = bounding_rect(contour)?;
            let aspect = w as f64 / h as f64;
            if aspect <= config.min_aspect || aspect >= config.max_aspect {
                return None;
            }
            Region::clamped(
                x as f64,
                y as f64,
                (x + w) as f64,
                (y + h) as f64,
                bounds,
            )
        })
        .collect()
}

fn color_mask(frame: &Frame, range: &HsvRange) -> GrayImage {
    GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
        if range.contains(rgb_to_hsv(frame.rgb_at(x, y))) {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// 8-bit HSV with hue halved into `[0, 180)`, matching OpenCV's convention.
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max > 0.0 { delta * 255.0 / max } else { 0.0 };
    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    [
        ((h / 2.0).round() as u32 % 180) as u8,
        s.round().clamp(0.0, 255.0) as u8,
        max as u8,
    ]
}

/// Shoelace area over the contour's border points.
fn contour_area(contour: &Contour<i32>) -> f64 {
    let points = &contour.points;
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    twice.abs() as f64 / 2.0
}

/// Inclusive pixel bounding rectangle `(x, y, width, height)`.
fn bounding_rect(contour: &Contour<i32>) -> Option<(i32, i32, i32, i32)> {
    let min_x = contour.points.iter().map(|p| p.x).min()?;
    let max_x = contour.points.iter().map(|p| p.x).max()?;
    let min_y = contour.points.iter().map(|p| p.y).min()?;
    let max_y = contour.points.iter().map(|p| p.y).max()?;
    Some((min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ChannelOrder;

    const SIGN_GREEN_BGR: [u8; 3] = [40, 150, 20];

    fn frame_with_rects(
        order: ChannelOrder,
        rects: &[(u32, u32, u32, u32)],
        color: [u8; 3],
    ) -> Frame {
        let mut frame = Frame::filled(320, 200, [90, 90, 90], order).unwrap();
        for &(x, y, w, h) in rects {
            for yy in y..y + h {
                for xx in x..x + w {
                    frame.put_pixel(xx, yy, color);
                }
            }
        }
        frame
    }

    #[test]
    fn hsv_matches_opencv_scale() {
        assert_eq!(rgb_to_hsv([0, 160, 0]), [60, 255, 160]);
        assert_eq!(rgb_to_hsv([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 255]), [120, 255, 255]);
        assert_eq!(rgb_to_hsv([128, 128, 128]), [0, 0, 128]);
    }

    #[test]
    fn finds_wide_green_panel() {
        let frame = frame_with_rects(ChannelOrder::Bgr, &[(40, 50, 100, 40)], SIGN_GREEN_BGR);
        let regions = SignSegmenter::default().detect_signs(&frame).unwrap();
        assert_eq!(
            regions,
            vec![Region {
                x1: 40,
                y1: 50,
                x2: 140,
                y2: 90
            }]
        );
    }

    #[test]
    fn respects_channel_order() {
        let frame = frame_with_rects(ChannelOrder::Rgb, &[(40, 50, 100, 40)], [20, 150, 40]);
        assert_eq!(SignSegmenter::default().detect_signs(&frame).unwrap().len(), 1);
        // Blue once the BGR bytes are read in RGB order.
        let swapped = frame_with_rects(ChannelOrder::Bgr, &[(40, 50, 100, 40)], [200, 60, 20]);
        assert!(SignSegmenter::default().detect_signs(&swapped).unwrap().is_empty());
    }

    #[test]
    fn rejects_wrong_shapes_and_sizes() {
        let frame = frame_with_rects(
            ChannelOrder::Bgr,
            &[
                (10, 10, 40, 40),   // square
                (10, 100, 20, 8),   // too small
                (100, 10, 200, 20), // too elongated
            ],
            SIGN_GREEN_BGR,
        );
        assert!(SignSegmenter::default().detect_signs(&frame).unwrap().is_empty());
    }

    #[test]
    fn closing_merges_fragmented_panel() {
        let mut frame = frame_with_rects(ChannelOrder::Bgr, &[(40, 50, 100, 40)], SIGN_GREEN_BGR);
        // A thin gap of background (text stroke) splitting the panel.
        for y in 50..90 {
            for x in 88..91 {
                frame.put_pixel(x, y, [255, 255, 255]);
            }
        }
        let regions = SignSegmenter::default().detect_signs(&frame).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].width(), 100);
    }

    #[test]
    fn caps_number_of_regions() {
        let rects = [
            (5, 5, 60, 20),
            (80, 5, 60, 20),
            (160, 5, 60, 20),
            (5, 60, 60, 20),
            (80, 60, 60, 20),
        ];
        let frame = frame_with_rects(ChannelOrder::Bgr, &rects, SIGN_GREEN_BGR);
        assert_eq!(segment(&frame, &SignSegmenterConfig::default()).len(), 5);
        assert_eq!(SignSegmenter::default().detect_signs(&frame).unwrap().len(), 3);

        let narrow = SignSegmenter::new(SignSegmenterConfig {
            max_regions: 2,
            ..SignSegmenterConfig::default()
        });
        assert_eq!(narrow.config().max_regions, 2);
        assert_eq!(narrow.config().range, GREEN_SIGN_RANGE);
        assert_eq!(narrow.detect_signs(&frame).unwrap().len(), 2);
    }
}
