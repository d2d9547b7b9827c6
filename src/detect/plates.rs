use crate::frame::Frame;
use crate::region::{FrameBounds, Region};

use super::backend::PlateModel;
use super::error::DetectionError;
use super::result::Detection;

pub const DEFAULT_PLATE_CONFIDENCE: f32 = 0.65;
pub const DEFAULT_MAX_PLATES: usize = 3;

/// Placeholder plate size used when no model is loaded.
const FALLBACK_PLATE_SIZE: (u32, u32) = (120, 30);

/// Typical plate positions as fractions of the frame: bottom-left, bottom-right.
const FALLBACK_ANCHORS: [(f64, f64); 2] = [(0.1, 0.8), (0.7, 0.75)];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlateDetectorConfig {
    pub confidence_threshold: f32,
    pub max_detections: usize,
}

impl Default for PlateDetectorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_PLATE_CONFIDENCE,
            max_detections: DEFAULT_MAX_PLATES,
        }
    }
}

/// License plate detector. Without a model it always returns the fixed fallback
/// regions so something is still redacted.
pub struct PlateDetector {
    model: Option<Box<dyn PlateModel>>,
    config: PlateDetectorConfig,
}

impl PlateDetector {
    pub fn new(model: Option<Box<dyn PlateModel>>, config: PlateDetectorConfig) -> Self {
        Self { model, config }
    }

    /// Detector permanently in fallback mode.
    pub fn fallback_only() -> Self {
        Self::new(None, PlateDetectorConfig::default())
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn model_name(&self) -> Option<&'static str> {
        self.model.as_ref().map(|model| model.name())
    }

    /// Accepted plate detections for this frame.
    pub fn detections(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectionError> {
        let bounds = frame.bounds();
        let Some(model) = self.model.as_mut() else {
            return Ok(fallback_regions(bounds)
                .into_iter()
                .map(|region| Detection {
                    region,
                    confidence: 0.0,
                    text: None,
                })
                .collect());
        };

        let threshold = self.config.confidence_threshold;
        let rgb = frame.to_rgb();
        let boxes = model.predict(&rgb, threshold, self.config.max_detections)?;
        Ok(boxes
            .into_iter()
            .filter(|b| b.confidence > threshold)
            .take(self.config.max_detections)
            .filter_map(|b| {
                let region = Region::clamped(
                    b.x1 as f64,
                    b.y1 as f64,
                    b.x2 as f64,
                    b.y2 as f64,
                    bounds,
                )?;
                Some(Detection {
                    region,
                    confidence: b.confidence,
                    text: None,
                })
            })
            .collect())
    }

    pub fn detect_plates(&mut self, frame: &Frame) -> Result<Vec<Region>, DetectionError> {
        Ok(self
            .detections(frame)?
            .into_iter()
            .map(|detection| detection.region)
            .collect())
    }
}

/// Fixed proportional plate regions for a frame size. A region is produced only
/// when it fits strictly inside the frame.
pub fn fallback_regions(bounds: FrameBounds) -> Vec<Region> {
    let (plate_w, plate_h) = FALLBACK_PLATE_SIZE;
    FALLBACK_ANCHORS
        .iter()
        .filter_map(|&(fx, fy)| {
            let x = (bounds.width as f64 * fx) as u32;
            let y = (bounds.height as f64 * fy) as u32;
            if x + plate_w < bounds.width && y + plate_h < bounds.height {
                Some(Region {
                    x1: x,
                    y1: y,
                    x2: x + plate_w,
                    y2: y + plate_h,
                })
            } else {
                None
            }
        })
        .collect()
}
