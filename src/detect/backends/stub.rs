//! Scripted backends for tests and demos.
//!
//! Each stub replays a list of responses, one per call, then keeps returning its
//! `idle` response. A shared `StubProbe` counts calls so tests can observe a stub
//! after it has been moved into a pipeline.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::{DynamicImage, RgbImage};

use crate::detect::backend::{PlateModel, TextEngine};
use crate::detect::error::DetectionError;
use crate::detect::result::{BoxDetection, TextDetection};

/// Shared call counters for a stub backend.
#[derive(Debug, Default)]
pub struct StubProbe {
    calls: AtomicUsize,
    grayscale_inputs: AtomicUsize,
}

impl StubProbe {
    /// Total number of calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls that received a single-channel (preprocessed) image.
    pub fn grayscale_inputs(&self) -> usize {
        self.grayscale_inputs.load(Ordering::SeqCst)
    }

    fn record(&self, grayscale: bool) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if grayscale {
            self.grayscale_inputs.fetch_add(1, Ordering::SeqCst);
        }
    }
}

struct Script<T> {
    responses: VecDeque<Result<Vec<T>, DetectionError>>,
    idle: Result<Vec<T>, DetectionError>,
}

impl<T: Clone> Script<T> {
    fn next(&mut self) -> Result<Vec<T>, DetectionError> {
        self.responses
            .pop_front()
            .unwrap_or_else(|| self.idle.clone())
    }
}

/// Plate model returning scripted boxes.
pub struct StubPlateModel {
    script: Script<BoxDetection>,
    probe: Arc<StubProbe>,
}

impl StubPlateModel {
    /// Replay `responses`, then return no boxes.
    pub fn scripted(responses: Vec<Result<Vec<BoxDetection>, DetectionError>>) -> Self {
        Self {
            script: Script {
                responses: responses.into(),
                idle: Ok(Vec::new()),
            },
            probe: Arc::default(),
        }
    }

    /// Return the same boxes on every call.
    pub fn repeating(boxes: Vec<BoxDetection>) -> Self {
        Self {
            script: Script {
                responses: VecDeque::new(),
                idle: Ok(boxes),
            },
            probe: Arc::default(),
        }
    }

    /// Fail on every call.
    pub fn failing(message: &str) -> Self {
        Self {
            script: Script {
                responses: VecDeque::new(),
                idle: Err(DetectionError::Inference(message.to_string())),
            },
            probe: Arc::default(),
        }
    }

    pub fn probe(&self) -> Arc<StubProbe> {
        Arc::clone(&self.probe)
    }
}

impl PlateModel for StubPlateModel {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn predict(
        &mut self,
        _image: &RgbImage,
        _confidence_threshold: f32,
        _max_detections: usize,
    ) -> Result<Vec<BoxDetection>, DetectionError> {
        self.probe.record(false);
        self.script.next()
    }
}

/// OCR engine returning scripted text hits.
pub struct StubTextEngine {
    script: Script<TextDetection>,
    probe: Arc<StubProbe>,
}

impl StubTextEngine {
    /// Replay `responses`, then return no text.
    pub fn scripted(responses: Vec<Result<Vec<TextDetection>, DetectionError>>) -> Self {
        Self {
            script: Script {
                responses: responses.into(),
                idle: Ok(Vec::new()),
            },
            probe: Arc::default(),
        }
    }

    /// Return the same hits on every call.
    pub fn repeating(hits: Vec<TextDetection>) -> Self {
        Self {
            script: Script {
                responses: VecDeque::new(),
                idle: Ok(hits),
            },
            probe: Arc::default(),
        }
    }

    /// Fail on every call.
    pub fn failing(message: &str) -> Self {
        Self {
            script: Script {
                responses: VecDeque::new(),
                idle: Err(DetectionError::Inference(message.to_string())),
            },
            probe: Arc::default(),
        }
    }

    pub fn probe(&self) -> Arc<StubProbe> {
        Arc::clone(&self.probe)
    }
}

impl TextEngine for StubTextEngine {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn read_text(
        &mut self,
        image: &DynamicImage,
        _allowlist: &str,
    ) -> Result<Vec<TextDetection>, DetectionError> {
        self.probe
            .record(matches!(image, DynamicImage::ImageLuma8(_)));
        self.script.next()
    }
}
