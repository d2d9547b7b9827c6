pub mod stub;
pub mod tsv;

#[cfg(feature = "ocr-tesseract")]
pub mod tesseract;
#[cfg(feature = "backend-tract")]
pub mod tract;

pub use stub::{StubPlateModel, StubProbe, StubTextEngine};

#[cfg(feature = "ocr-tesseract")]
pub use tesseract::TesseractEngine;
#[cfg(feature = "backend-tract")]
pub use tract::TractPlateModel;
