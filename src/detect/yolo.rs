//! Decoding for single-stage detector output of shape `[1, 4 + classes, anchors]`
//! (center x, center y, width, height, then one score per class).

use super::error::DetectionError;
use super::result::BoxDetection;

pub const NMS_IOU_THRESHOLD: f32 = 0.45;

/// Decode raw output into frame-space boxes above `confidence_threshold`.
///
/// `values` is the flattened `[channels, anchors]` tensor. Box coordinates are in
/// model input pixels and are scaled by `(scale_x, scale_y)` into the frame.
pub fn decode(
    values: &[f32],
    channels: usize,
    anchors: usize,
    confidence_threshold: f32,
    (scale_x, scale_y): (f32, f32),
) -> Result<Vec<BoxDetection>, DetectionError> {
    if channels < 5 {
        return Err(DetectionError::UnexpectedOutput(format!(
            "expected at least 5 output channels, got {}",
            channels
        )));
    }
    if values.len() != channels * anchors {
        return Err(DetectionError::UnexpectedOutput(format!(
            "output has {} values, expected {}x{}",
            values.len(),
            channels,
            anchors
        )));
    }

    let at = |channel: usize, anchor: usize| values[channel * anchors + anchor];
    let mut boxes = Vec::new();
    for anchor in 0..anchors {
        let confidence = (4..channels)
            .map(|channel| at(channel, anchor))
            .fold(f32::NEG_INFINITY, f32::max);
        if !confidence.is_finite() || confidence < confidence_threshold {
            continue;
        }
        let (cx, cy, w, h) = (
            at(0, anchor),
            at(1, anchor),
            at(2, anchor),
            at(3, anchor),
        );
        boxes.push(BoxDetection {
            x1: (cx - w / 2.0) * scale_x,
            y1: (cy - h / 2.0) * scale_y,
            x2: (cx + w / 2.0) * scale_x,
            y2: (cy + h / 2.0) * scale_y,
            confidence,
        });
    }
    Ok(boxes)
}

fn iou(a: &BoxDetection, b: &BoxDetection) -> f32 {
    let ix = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let iy = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    let intersection = ix * iy;
    let area_a = (a.x2 - a.x1).max(0.0) * (a.y2 - a.y1).max(0.0);
    let area_b = (b.x2 - b.x1).max(0.0) * (b.y2 - b.y1).max(0.0);
    let union = area_a + area_b - intersection;
    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Class-agnostic non-maximum suppression. Output is sorted by confidence,
/// best first, and holds at most `max_detections` boxes.
pub fn non_max_suppression(
    mut boxes: Vec<BoxDetection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<BoxDetection> {
    boxes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut kept: Vec<BoxDetection> = Vec::new();
    for candidate in boxes {
        if kept.len() >= max_detections {
            break;
        }
        if kept.iter().all(|k| iou(k, &candidate) <= iou_threshold) {
            kept.push(candidate);
        }
    }
    kept
}
