use thiserror::Error;

/// Failure of one detection cycle.
///
/// Adapters return this instead of swallowing failures; the pipeline decides what a
/// failed cycle means for the cached regions (see `FailurePolicy`).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectionError {
    #[error("{0} is not available")]
    Unavailable(&'static str),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("preprocessing failed: {0}")]
    Preprocess(String),
    #[error("unexpected engine output: {0}")]
    UnexpectedOutput(String),
    #[error("frame {width}x{height} is too small for {stage}")]
    FrameTooSmall {
        width: u32,
        height: u32,
        stage: &'static str,
    },
}
