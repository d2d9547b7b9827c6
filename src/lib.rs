//! StreamSafe
//!
//! Real-time privacy redaction for video streams: license plates, street signs
//! and building/block numbers are located and blurred in place, frame by frame.
//!
//! # Architecture
//!
//! Running every detector on every frame is too slow for interactive frame rates,
//! so each detector sits behind a temporal cache:
//!
//! 1. **Detect rarely**: a detector re-runs only every `refresh_period` frames
//!    (plates every frame, signs every 15, block numbers every 30).
//! 2. **Blur always**: the regions from the last detection cycle are blurred on
//!    every frame the detector is enabled.
//! 3. **Degrade, never stop**: a missing model or a failed cycle means less
//!    redaction, not a dropped frame. Only a malformed frame is an error.
//!
//! # Module Structure
//!
//! - `frame`: `Frame` buffer and channel order
//! - `region`: canonical rectangles and raw geometry validation
//! - `text`: OCR text cleanup and identifier grammar
//! - `detect`: plate, identifier and sign detectors plus engine backends
//! - `cache`: per-detector refresh gate
//! - `redact`: in-place blur transforms
//! - `pipeline`: the per-frame orchestrator
//! - `config`: file and environment configuration
//! - `source`: synthetic and still frame sources for demos

pub mod cache;
pub mod config;
pub mod detect;
pub mod frame;
pub mod pipeline;
pub mod redact;
pub mod region;
pub mod source;
pub mod text;

pub use cache::{DetectorCache, FailurePolicy, Tick};
pub use config::PipelineConfig;
pub use detect::{Detection, DetectionError, PlateModel, TextEngine};
pub use frame::{ChannelOrder, Frame, FrameError};
pub use pipeline::{DetectionSettings, DetectorKind, Pipeline, ProcessReport, SharedPipeline};
pub use redact::BlurKind;
pub use region::{extract, FrameBounds, RawGeometry, Region};
pub use source::{FrameSource, SourceConfig, SyntheticSource};
pub use text::{matches_identifier, normalize};
