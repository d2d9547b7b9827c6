use crate::region::{RawGeometry, Region};

/// Accepted detection: a validated region, its score and, for OCR, the cleaned text.
///
/// Transient: produced during a detection cycle and reduced to its region before caching.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub region: Region,
    pub confidence: f32,
    pub text: Option<String>,
}

/// Raw box from an object detection model, in frame pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxDetection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: f32,
}

/// Raw text hit from an OCR engine. Geometry is unvalidated.
#[derive(Clone, Debug, PartialEq)]
pub struct TextDetection {
    pub geometry: Option<RawGeometry>,
    pub text: String,
    pub confidence: f32,
}

impl TextDetection {
    pub fn new(geometry: RawGeometry, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            geometry: Some(geometry),
            text: text.into(),
            confidence,
        }
    }
}
