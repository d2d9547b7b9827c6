use image::{DynamicImage, RgbImage};

use super::error::DetectionError;
use super::result::{BoxDetection, TextDetection};

/// Object detection model used for license plates.
///
/// # Audit Boundary
///
/// Implementations receive a borrowed RGB copy of the frame and MUST NOT keep it
/// beyond the call. They return geometry only.
pub trait PlateModel: Send {
    /// Model identifier for diagnostics.
    fn name(&self) -> &'static str;

    /// Run the model. Boxes are in `image` pixel coordinates, best first.
    fn predict(
        &mut self,
        image: &RgbImage,
        confidence_threshold: f32,
        max_detections: usize,
    ) -> Result<Vec<BoxDetection>, DetectionError>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<(), DetectionError> {
        Ok(())
    }
}

/// OCR engine used for block identifiers.
///
/// Same audit boundary as `PlateModel`: pixels in, text and geometry out.
pub trait TextEngine: Send {
    /// Engine identifier for diagnostics.
    fn name(&self) -> &'static str;

    /// Recognize text restricted to the characters in `allowlist`.
    fn read_text(
        &mut self,
        image: &DynamicImage,
        allowlist: &str,
    ) -> Result<Vec<TextDetection>, DetectionError>;
}
