use image::DynamicImage;

use crate::frame::Frame;
use crate::region::{extract, Region, DEFAULT_PADDING};
use crate::text::{matches_identifier, normalize, OCR_ALLOWLIST};

use super::backend::TextEngine;
use super::error::DetectionError;
use super::preprocess::preprocess_for_ocr;
use super::result::Detection;

pub const DEFAULT_IDENTIFIER_CONFIDENCE: f32 = 0.4;
pub const DEFAULT_MAX_IDENTIFIERS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IdentifierDetectorConfig {
    /// Hits must score strictly above this.
    pub confidence_threshold: f32,
    pub max_regions: usize,
    pub padding: u32,
}

impl Default for IdentifierDetectorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_IDENTIFIER_CONFIDENCE,
            max_regions: DEFAULT_MAX_IDENTIFIERS,
            padding: DEFAULT_PADDING,
        }
    }
}

/// Building/block number detector built on an OCR engine.
///
/// Without an engine every cycle reports `DetectionError::Unavailable`.
pub struct IdentifierDetector {
    engine: Option<Box<dyn TextEngine>>,
    config: IdentifierDetectorConfig,
}

impl IdentifierDetector {
    pub fn new(engine: Option<Box<dyn TextEngine>>, config: IdentifierDetectorConfig) -> Self {
        Self { engine, config }
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    pub fn engine_name(&self) -> Option<&'static str> {
        self.engine.as_ref().map(|engine| engine.name())
    }

    /// Text hits that pass geometry, confidence and identifier grammar checks.
    pub fn detections(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectionError> {
        let engine = self
            .engine
            .as_mut()
            .ok_or(DetectionError::Unavailable("OCR engine"))?;

        let rgb = frame.to_rgb();
        let input = match preprocess_for_ocr(&rgb) {
            Ok(binary) => DynamicImage::ImageLuma8(binary),
            Err(err) => {
                log::debug!("OCR preprocessing failed, using raw frame: {}", err);
                DynamicImage::ImageRgb8(rgb)
            }
        };

        let hits = engine.read_text(&input, OCR_ALLOWLIST)?;
        let bounds = frame.bounds();
        let config = self.config;

        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                let region = extract(hit.geometry.as_ref(), bounds, config.padding)?;
                if !(hit.confidence > config.confidence_threshold) {
                    return None;
                }
                let cleaned = normalize(&hit.text);
                if !matches_identifier(&cleaned) {
                    return None;
                }
                Some(Detection {
                    region,
                    confidence: hit.confidence,
                    text: Some(cleaned),
                })
            })
            .take(config.max_regions)
            .collect())
    }

    pub fn detect_identifiers(&mut self, frame: &Frame) -> Result<Vec<Region>, DetectionError> {
        Ok(self
            .detections(frame)?
            .into_iter()
            .map(|detection| detection.region)
            .collect())
    }
}
