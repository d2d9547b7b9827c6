#![cfg(feature = "ocr-tesseract")]

use std::io::Cursor;
use std::path::Path;

use anyhow::{anyhow, Result};
use image::{DynamicImage, ImageFormat};
use leptess::{LepTess, Variable};

use crate::detect::backend::TextEngine;
use crate::detect::error::DetectionError;
use crate::detect::result::TextDetection;

use super::tsv::parse_tsv;

/// Tesseract OCR engine (via leptess), word-level results.
pub struct TesseractEngine {
    tess: LepTess,
}

impl TesseractEngine {
    /// Initialize Tesseract with an optional tessdata directory.
    pub fn new(tessdata: Option<&Path>, language: &str) -> Result<Self> {
        let datapath = match tessdata {
            Some(path) => Some(
                path.to_str()
                    .ok_or_else(|| anyhow!("tessdata path is not valid UTF-8"))?
                    .to_string(),
            ),
            None => None,
        };
        let mut tess = LepTess::new(datapath.as_deref(), language)
            .map_err(|e| anyhow!("failed to initialize Tesseract ({}): {}", language, e))?;
        // PSM 11: sparse text, find as much text as possible in no particular order.
        tess.set_variable(Variable::TesseditPagesegMode, "11")
            .map_err(|e| anyhow!("failed to set page segmentation mode: {}", e))?;
        log::info!("Tesseract OCR initialized (lang={})", language);
        Ok(Self { tess })
    }
}

impl TextEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn read_text(
        &mut self,
        image: &DynamicImage,
        allowlist: &str,
    ) -> Result<Vec<TextDetection>, DetectionError> {
        self.tess
            .set_variable(Variable::TesseditCharWhitelist, allowlist)
            .map_err(|e| DetectionError::Inference(format!("failed to set allow-list: {}", e)))?;

        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| DetectionError::Inference(format!("failed to encode image: {}", e)))?;
        self.tess
            .set_image_from_mem(&png)
            .map_err(|e| DetectionError::Inference(format!("failed to load image: {}", e)))?;

        let tsv = self
            .tess
            .get_tsv_text(0)
            .map_err(|e| DetectionError::UnexpectedOutput(format!("TSV not UTF-8: {}", e)))?;
        Ok(parse_tsv(&tsv))
    }
}
