//! Region detectors and the engine seams they run on.
//!
//! Three detectors feed the redaction pipeline: a plate model adapter, an OCR
//! adapter for block identifiers, and a model-free color/contour segmenter for
//! street signs. Engines sit behind the `PlateModel` and `TextEngine` traits.

mod backend;
pub mod backends;
mod error;
mod identifiers;
mod plates;
pub mod preprocess;
mod result;
mod signs;
pub mod yolo;

pub use backend::{PlateModel, TextEngine};
pub use error::DetectionError;
pub use identifiers::{
    IdentifierDetector, IdentifierDetectorConfig, DEFAULT_IDENTIFIER_CONFIDENCE,
    DEFAULT_MAX_IDENTIFIERS,
};
pub use plates::{
    fallback_regions, PlateDetector, PlateDetectorConfig, DEFAULT_MAX_PLATES,
    DEFAULT_PLATE_CONFIDENCE,
};
pub use result::{BoxDetection, Detection, TextDetection};
pub use signs::{rgb_to_hsv, segment, HsvRange, SignSegmenter, SignSegmenterConfig, GREEN_SIGN_RANGE};
