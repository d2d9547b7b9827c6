//! Frame redaction orchestrator.
//!
//! A `Pipeline` owns one detector and one `DetectorCache` per detector kind. Each
//! call to `process` walks the enabled detectors in a fixed order (plates, block
//! identifiers, street signs), advances their caches, and blurs whatever regions
//! are cached afterwards. Detectors see the frame as left by the ones before them.
//!
//! A pipeline is not safe to drive from several threads at once; wrap it in a
//! `SharedPipeline` or keep one per stream.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use serde::Deserialize;

use crate::cache::{DetectorCache, Tick};
use crate::config::{IdentifierSettings, PipelineConfig, PlateSettings};
use crate::detect::{
    DetectionError, IdentifierDetector, IdentifierDetectorConfig, PlateDetector,
    PlateDetectorConfig, PlateModel, SignSegmenter, SignSegmenterConfig, TextEngine,
};
use crate::frame::{ChannelOrder, Frame, FrameError};
use crate::redact::{redact_regions, BlurKind, IDENTIFIER_KERNEL, PLATE_KERNEL, SIGN_KERNEL};
use crate::region::Region;

/// The detectors a pipeline runs, in processing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DetectorKind {
    LicensePlates,
    BlockNumbers,
    StreetSigns,
}

impl DetectorKind {
    pub const ALL: [DetectorKind; 3] = [
        DetectorKind::LicensePlates,
        DetectorKind::BlockNumbers,
        DetectorKind::StreetSigns,
    ];

    /// Settings key for this detector.
    pub fn key(self) -> &'static str {
        match self {
            DetectorKind::LicensePlates => "license_plates",
            DetectorKind::BlockNumbers => "block_numbers",
            DetectorKind::StreetSigns => "street_signs",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    pub fn blur(self) -> BlurKind {
        match self {
            DetectorKind::LicensePlates => BlurKind::Gaussian {
                kernel: PLATE_KERNEL,
            },
            DetectorKind::BlockNumbers => BlurKind::Box {
                kernel: IDENTIFIER_KERNEL,
            },
            DetectorKind::StreetSigns => BlurKind::Box {
                kernel: SIGN_KERNEL,
            },
        }
    }

    fn index(self) -> usize {
        match self {
            DetectorKind::LicensePlates => 0,
            DetectorKind::BlockNumbers => 1,
            DetectorKind::StreetSigns => 2,
        }
    }
}

impl std::fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Per-call enabled flags. Missing or unknown keys mean disabled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    pub license_plates: bool,
    pub block_numbers: bool,
    pub street_signs: bool,
}

impl DetectionSettings {
    /// Everything enabled.
    pub fn all() -> Self {
        Self {
            license_plates: true,
            block_numbers: true,
            street_signs: true,
        }
    }

    /// Only `kind` enabled.
    pub fn only(kind: DetectorKind) -> Self {
        Self::default().with(kind, true)
    }

    pub fn with(mut self, kind: DetectorKind, enabled: bool) -> Self {
        match kind {
            DetectorKind::LicensePlates => self.license_plates = enabled,
            DetectorKind::BlockNumbers => self.block_numbers = enabled,
            DetectorKind::StreetSigns => self.street_signs = enabled,
        }
        self
    }

    /// Build from `name -> enabled` pairs as a dashboard would send them.
    pub fn from_map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, bool)>,
        K: AsRef<str>,
    {
        entries
            .into_iter()
            .fold(Self::default(), |settings, (key, enabled)| {
                match DetectorKind::from_key(key.as_ref()) {
                    Some(kind) => settings.with(kind, enabled),
                    None => settings,
                }
            })
    }

    pub fn is_enabled(&self, kind: DetectorKind) -> bool {
        match kind {
            DetectorKind::LicensePlates => self.license_plates,
            DetectorKind::BlockNumbers => self.block_numbers,
            DetectorKind::StreetSigns => self.street_signs,
        }
    }
}

/// What one `process` call did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProcessReport {
    /// Detectors whose refresh ran and succeeded.
    pub refreshed: Vec<DetectorKind>,
    /// Detectors whose refresh ran and failed.
    pub failed: Vec<(DetectorKind, DetectionError)>,
    /// Regions blurred across all detectors.
    pub redacted: usize,
}

impl ProcessReport {
    pub fn was_refreshed(&self, kind: DetectorKind) -> bool {
        self.refreshed.contains(&kind)
    }

    pub fn failure(&self, kind: DetectorKind) -> Option<&DetectionError> {
        self.failed
            .iter()
            .find(|(failed, _)| *failed == kind)
            .map(|(_, err)| err)
    }
}

enum Detector {
    Plates(PlateDetector),
    Identifiers(IdentifierDetector),
    Signs(SignSegmenter),
}

impl Detector {
    fn refresh(&mut self, frame: &Frame) -> Result<Vec<Region>, DetectionError> {
        match self {
            Detector::Plates(detector) => detector.detect_plates(frame),
            // No engine is the degraded mode, not a failed cycle.
            Detector::Identifiers(detector) if !detector.has_engine() => Ok(Vec::new()),
            Detector::Identifiers(detector) => detector.detect_identifiers(frame),
            Detector::Signs(segmenter) => segmenter.detect_signs(frame),
        }
    }
}

struct Slot {
    kind: DetectorKind,
    detector: Detector,
    cache: DetectorCache,
}

pub struct Pipeline {
    slots: [Slot; 3],
}

impl Pipeline {
    /// Load the configured model and OCR engine and build the pipeline.
    ///
    /// Only an invalid configuration is an error. A model or engine that cannot be
    /// loaded leaves its detector degraded for the life of the pipeline.
    pub fn construct(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        let plate_model = load_plate_model(&config.plates);
        let text_engine = load_text_engine(&config.identifiers);
        Ok(Self::assemble(config, plate_model, text_engine))
    }

    /// Build with caller-supplied engines.
    pub fn with_backends(
        config: &PipelineConfig,
        plate_model: Option<Box<dyn PlateModel>>,
        text_engine: Option<Box<dyn TextEngine>>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, plate_model, text_engine))
    }

    fn assemble(
        config: &PipelineConfig,
        plate_model: Option<Box<dyn PlateModel>>,
        text_engine: Option<Box<dyn TextEngine>>,
    ) -> Self {
        let policy = config.failure_policy;
        let plates = PlateDetector::new(
            plate_model,
            PlateDetectorConfig {
                confidence_threshold: config.plates.confidence,
                max_detections: config.plates.max_detections,
            },
        );
        let identifiers = IdentifierDetector::new(
            text_engine,
            IdentifierDetectorConfig {
                confidence_threshold: config.identifiers.confidence,
                max_regions: config.identifiers.max_regions,
                padding: config.identifiers.padding,
            },
        );
        let signs = SignSegmenter::new(SignSegmenterConfig {
            max_regions: config.signs.max_regions,
            ..SignSegmenterConfig::default()
        });

        log::info!(
            "pipeline ready: plates={} identifiers={} policy={:?}",
            plates.model_name().unwrap_or("fallback"),
            identifiers.engine_name().unwrap_or("disabled"),
            policy,
        );

        Self {
            slots: [
                Slot {
                    kind: DetectorKind::LicensePlates,
                    detector: Detector::Plates(plates),
                    cache: DetectorCache::new(config.plates.refresh_period, policy),
                },
                Slot {
                    kind: DetectorKind::BlockNumbers,
                    detector: Detector::Identifiers(identifiers),
                    cache: DetectorCache::new(config.identifiers.refresh_period, policy),
                },
                Slot {
                    kind: DetectorKind::StreetSigns,
                    detector: Detector::Signs(signs),
                    cache: DetectorCache::new(config.signs.refresh_period, policy),
                },
            ],
        }
    }

    /// Redact `frame` in place for the enabled detectors.
    pub fn process(&mut self, frame: &mut Frame, settings: &DetectionSettings) -> ProcessReport {
        let mut report = ProcessReport::default();
        for slot in self.slots.iter_mut() {
            if !settings.is_enabled(slot.kind) {
                continue;
            }
            let Slot {
                kind,
                detector,
                cache,
            } = slot;
            match cache.tick(|| detector.refresh(&*frame)) {
                Tick::Reused => {}
                Tick::Refreshed => report.refreshed.push(*kind),
                Tick::Failed(err) => {
                    log::debug!("{} refresh failed: {}", kind, err);
                    report.failed.push((*kind, err));
                }
            }
            report.redacted += redact_regions(frame, cache.regions(), kind.blur());
        }
        report
    }

    /// Byte-buffer form of `process`: same dimensions and channel order out as in.
    pub fn process_raw(
        &mut self,
        data: &[u8],
        width: u32,
        height: u32,
        order: ChannelOrder,
        settings: &DetectionSettings,
    ) -> Result<Vec<u8>, FrameError> {
        let mut frame = Frame::new(data.to_vec(), width, height, order)?;
        self.process(&mut frame, settings);
        Ok(frame.into_bytes())
    }

    /// Zero every counter and drop every cached region.
    pub fn reset(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.cache.reset();
        }
    }

    pub fn reset_detector(&mut self, kind: DetectorKind) {
        self.slots[kind.index()].cache.reset();
    }

    pub fn cache(&self, kind: DetectorKind) -> &DetectorCache {
        &self.slots[kind.index()].cache
    }

    pub fn plate_model_loaded(&self) -> bool {
        match &self.slots[DetectorKind::LicensePlates.index()].detector {
            Detector::Plates(detector) => detector.has_model(),
            _ => false,
        }
    }

    pub fn text_engine_loaded(&self) -> bool {
        match &self.slots[DetectorKind::BlockNumbers.index()].detector {
            Detector::Identifiers(detector) => detector.has_engine(),
            _ => false,
        }
    }
}

/// A pipeline shared between threads; `process` calls are serialized.
#[derive(Clone)]
pub struct SharedPipeline {
    inner: Arc<Mutex<Pipeline>>,
}

impl SharedPipeline {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pipeline)),
        }
    }

    pub fn process(&self, frame: &mut Frame, settings: &DetectionSettings) -> ProcessReport {
        self.with(|pipeline| pipeline.process(frame, settings))
    }

    pub fn reset(&self) {
        self.with(Pipeline::reset)
    }

    /// Run `f` with the pipeline locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut Pipeline) -> R) -> R {
        // A panic mid-frame leaves caches consistent, so poisoning is ignored.
        let mut guard = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}

fn load_plate_model(settings: &PlateSettings) -> Option<Box<dyn PlateModel>> {
    let Some(path) = settings.model_path.as_deref() else {
        log::warn!("no plate model configured; plate detector will use fallback regions");
        return None;
    };

    #[cfg(feature = "backend-tract")]
    {
        use crate::detect::backends::TractPlateModel;

        let mut model = match TractPlateModel::new(path, settings.input_size) {
            Ok(model) => model,
            Err(e) => {
                log::warn!(
                    "plate model {} failed to load ({:#}); using fallback regions",
                    path.display(),
                    e
                );
                return None;
            }
        };
        if let Err(e) = model.warm_up() {
            log::warn!(
                "plate model {} failed warm-up ({}); using fallback regions",
                path.display(),
                e
            );
            return None;
        }
        log::info!("plate model loaded from {}", path.display());
        Some(Box::new(model))
    }

    #[cfg(not(feature = "backend-tract"))]
    {
        log::warn!(
            "plate model {} configured but backend-tract is not enabled; using fallback regions",
            path.display()
        );
        None
    }
}

fn load_text_engine(settings: &IdentifierSettings) -> Option<Box<dyn TextEngine>> {
    #[cfg(feature = "ocr-tesseract")]
    {
        use crate::detect::backends::TesseractEngine;

        match TesseractEngine::new(settings.tessdata_path.as_deref(), &settings.language) {
            Ok(engine) => {
                log::info!("tesseract engine loaded ({})", settings.language);
                Some(Box::new(engine))
            }
            Err(e) => {
                log::warn!(
                    "tesseract failed to initialise ({:#}); block identifiers will not be redacted",
                    e
                );
                None
            }
        }
    }

    #[cfg(not(feature = "ocr-tesseract"))]
    {
        let _ = settings;
        log::warn!("ocr-tesseract is not enabled; block identifiers will not be redacted");
        None
    }
}
