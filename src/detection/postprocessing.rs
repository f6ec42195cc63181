use crate::detection::labels::LabelMap;
use crate::error::{Result, TrafficError};
use crate::models::{BoundingBox, Detection, DetectionSet};

/// Raw set-prediction output for one image
///
/// `logits` is `num_queries x (num_classes + 1)` row-major, the last column
/// being the "no object" class. `boxes` is `num_queries x 4` with normalised
/// `(cx, cy, w, h)`.
#[derive(Debug, Clone)]
pub struct RawPredictions {
    pub logits: Vec<f32>,
    pub boxes: Vec<f32>,
    pub num_queries: usize,
    pub num_logits: usize,
}

impl RawPredictions {
    pub fn new(
        logits: Vec<f32>,
        boxes: Vec<f32>,
        num_queries: usize,
        num_logits: usize,
    ) -> Result<Self> {
        if num_logits < 2 {
            return Err(TrafficError::Inference(format!(
                "expected at least 2 logits per query, got {}",
                num_logits
            )));
        }
        if logits.len() != num_queries * num_logits || boxes.len() != num_queries * 4 {
            return Err(TrafficError::Inference(format!(
                "prediction shape mismatch: {} logits and {} box values for {} queries",
                logits.len(),
                boxes.len(),
                num_queries
            )));
        }
        Ok(Self {
            logits,
            boxes,
            num_queries,
            num_logits,
        })
    }
}

/// Softmax over one row of logits
pub fn softmax(row: &[f32]) -> Vec<f32> {
    let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = row.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Normalised centre-size box to absolute corners
pub fn center_to_corners(
    cx: f32,
    cy: f32,
    w: f32,
    h: f32,
    width: u32,
    height: u32,
) -> BoundingBox {
    let (iw, ih) = (width as f32, height as f32);
    BoundingBox::new(
        (cx - 0.5 * w) * iw,
        (cy - 0.5 * h) * ih,
        (cx + 0.5 * w) * iw,
        (cy + 0.5 * h) * ih,
    )
}

/// Turn raw predictions into detections at or above `threshold`, with boxes in
/// the coordinates of an image of `width x height`.
pub fn decode_detections(
    raw: &RawPredictions,
    labels: &LabelMap,
    threshold: f32,
    width: u32,
    height: u32,
) -> DetectionSet {
    let mut detections = Vec::new();

    for q in 0..raw.num_queries {
        let row = &raw.logits[q * raw.num_logits..(q + 1) * raw.num_logits];
        let probs = softmax(row);

        // Drop the trailing "no object" class
        let best = probs[..raw.num_logits - 1]
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (id, p)| match best {
                Some((_, bp)) if bp >= p => best,
                _ => Some((id, p)),
            });

        let Some((class_id, score)) = best else {
            continue;
        };
        if score < threshold {
            continue;
        }

        let b = &raw.boxes[q * 4..q * 4 + 4];
        let bbox = center_to_corners(b[0], b[1], b[2], b[3], width, height).rounded();
        detections.push(Detection::new(labels.name(class_id), score, bbox));
    }

    detections
}
