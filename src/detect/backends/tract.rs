#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::RgbImage;
use tract_onnx::prelude::*;

use crate::detect::backend::PlateModel;
use crate::detect::error::DetectionError;
use crate::detect::result::BoxDetection;
use crate::detect::yolo::{self, NMS_IOU_THRESHOLD};

/// Tract-based plate detector for ONNX models with a square RGB input and
/// `[1, 4 + classes, anchors]` output.
///
/// This backend loads a local model file and performs inference on RGB frames.
/// It does not perform any network I/O or write to disk beyond model loading.
pub struct TractPlateModel {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>,
    input_size: u32,
}

impl TractPlateModel {
    /// Load an ONNX model from disk and prepare it for `input_size` x `input_size` input.
    pub fn new<P: AsRef<Path>>(model_path: P, input_size: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let size = input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self { model, input_size })
    }

    fn build_input(&self, image: &RgbImage) -> Tensor {
        let size = self.input_size;
        let resized = image::imageops::resize(image, size, size, FilterType::Triangle);
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, size as usize, size as usize),
            |(_, channel, y, x)| resized.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0,
        );
        input.into_tensor()
    }
}

impl PlateModel for TractPlateModel {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn predict(
        &mut self,
        image: &RgbImage,
        confidence_threshold: f32,
        max_detections: usize,
    ) -> Result<Vec<BoxDetection>, DetectionError> {
        let input = self.build_input(image);
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| DetectionError::Inference(format!("ONNX inference failed: {}", e)))?;
        let output = outputs
            .first()
            .ok_or_else(|| DetectionError::UnexpectedOutput("model produced no outputs".into()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| DetectionError::UnexpectedOutput(format!("output not f32: {}", e)))?;
        let shape = view.shape().to_vec();
        let (channels, anchors) = match shape.as_slice() {
            [1, channels, anchors] => (*channels, *anchors),
            other => {
                return Err(DetectionError::UnexpectedOutput(format!(
                    "unexpected output shape {:?}",
                    other
                )))
            }
        };
        let values: Vec<f32> = view.iter().copied().collect();
        let scale = (
            image.width() as f32 / self.input_size as f32,
            image.height() as f32 / self.input_size as f32,
        );
        let boxes = yolo::decode(&values, channels, anchors, confidence_threshold, scale)?;
        Ok(yolo::non_max_suppression(
            boxes,
            NMS_IOU_THRESHOLD,
            max_detections,
        ))
    }

    fn warm_up(&mut self) -> Result<(), DetectionError> {
        let blank = RgbImage::new(self.input_size, self.input_size);
        self.predict(&blank, 1.0, 0).map(|_| ())
    }
}
