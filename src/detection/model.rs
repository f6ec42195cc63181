use crate::config::ModelConfig;
use crate::detection::labels::LabelMap;
use crate::detection::postprocessing::{self, RawPredictions};
use crate::detection::preprocessing;
use crate::detection::ObjectDetector;
use crate::error::{Result, TrafficError};
use crate::models::DetectionSet;
use crate::pipeline::ensure_not_empty;
use image::RgbImage;
use rten::{Model, NodeId};
use rten_tensor::prelude::*;
use rten_tensor::NdTensor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// DETR set-prediction detector running on an `.rten` checkpoint
pub struct DetrDetector {
    model: Model,
    name: String,
    labels: LabelMap,
    confidence_threshold: f32,
    pixel_values: NodeId,
    pixel_mask: Option<NodeId>,
    logits: NodeId,
    pred_boxes: NodeId,
}

impl DetrDetector {
    /// Load the checkpoint at `model_path`, resolving class ids through `labels`
    pub fn load(model_path: &Path, labels: LabelMap, confidence_threshold: f32) -> Result<Self> {
        let load_error = |reason: String| TrafficError::ModelLoad {
            path: model_path.to_path_buf(),
            reason,
        };

        if !model_path.exists() {
            return Err(load_error(
                "checkpoint not found; export facebook/detr-resnet-50 to ONNX \
                 and convert it with rten-convert"
                    .to_string(),
            ));
        }

        let model = Model::load_file(model_path).map_err(|e| load_error(e.to_string()))?;

        let inputs = model.input_ids().to_vec();
        let outputs = model.output_ids().to_vec();

        let pixel_values = model
            .find_node("pixel_values")
            .or_else(|| inputs.first().copied())
            .ok_or_else(|| load_error("model has no inputs".to_string()))?;
        let pixel_mask = model
            .find_node("pixel_mask")
            .filter(|id| inputs.contains(id));
        let logits = model
            .find_node("logits")
            .or_else(|| outputs.first().copied())
            .ok_or_else(|| load_error("model has no logits output".to_string()))?;
        let pred_boxes = model
            .find_node("pred_boxes")
            .or_else(|| outputs.get(1).copied())
            .ok_or_else(|| load_error("model has no box output".to_string()))?;

        debug!(
            inputs = inputs.len(),
            outputs = outputs.len(),
            with_mask = pixel_mask.is_some(),
            "detector graph resolved"
        );

        Ok(Self {
            model,
            name: checkpoint_name(model_path),
            labels,
            confidence_threshold,
            pixel_values,
            pixel_mask,
            logits,
            pred_boxes,
        })
    }

    fn infer(&self, input: &RgbImage) -> Result<RawPredictions> {
        let pixel_values = preprocessing::to_normalized_tensor(input);
        let mask = preprocessing::pixel_mask(input.width(), input.height());

        let mut inputs = vec![(self.pixel_values, pixel_values.view().into())];
        if let Some(mask_id) = self.pixel_mask {
            inputs.push((mask_id, mask.view().into()));
        }

        let mut outputs = self
            .model
            .run(inputs, &[self.logits, self.pred_boxes], None)
            .map_err(|e| TrafficError::Inference(e.to_string()))?;

        if outputs.len() != 2 {
            return Err(TrafficError::Inference(format!(
                "expected 2 outputs, got {}",
                outputs.len()
            )));
        }
        let boxes: NdTensor<f32, 3> = outputs
            .remove(1)
            .try_into()
            .map_err(|e| TrafficError::Inference(format!("unexpected box output: {:?}", e)))?;
        let logits: NdTensor<f32, 3> = outputs
            .remove(0)
            .try_into()
            .map_err(|e| TrafficError::Inference(format!("unexpected logits output: {:?}", e)))?;

        let [_, num_queries, num_logits] = logits.shape();
        RawPredictions::new(logits.to_vec(), boxes.to_vec(), num_queries, num_logits)
    }
}

impl ObjectDetector for DetrDetector {
    fn detect(&self, image: &RgbImage) -> Result<DetectionSet> {
        ensure_not_empty(image)?;
        let (width, height) = image.dimensions();

        let resized = preprocessing::resize_for_model(image);
        ensure_not_empty(&resized)?;
        debug!(
            width,
            height,
            model_width = resized.width(),
            model_height = resized.height(),
            "running detector"
        );

        let raw = self.infer(&resized)?;
        // Boxes are normalised, so they map straight back onto the original size
        Ok(postprocessing::decode_detections(
            &raw,
            &self.labels,
            self.confidence_threshold,
            width,
            height,
        ))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn labels(&self) -> &LabelMap {
        &self.labels
    }
}

/// Display name for a checkpoint: its file stem, e.g. `detr-resnet-50`
fn checkpoint_name(model_path: &Path) -> String {
    model_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "DETR ResNet-50".to_string())
}

type LoadFn = dyn Fn() -> Result<Arc<dyn ObjectDetector>> + Send + Sync;

/// Loads the detector once per process and hands out the shared handle
pub struct ModelLoader {
    load_fn: Box<LoadFn>,
    // Initialized on first `load`, read-only afterwards
    detector: Mutex<Option<Arc<dyn ObjectDetector>>>,
}

impl ModelLoader {
    /// Loader for the checkpoint and vocabulary named in `config`
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let model_path: PathBuf = config.checkpoint_path()?;
        let labels_path = config.labels_path.clone();
        let threshold = config.confidence_threshold;

        Ok(Self::with_factory(move || {
            let labels = match &labels_path {
                Some(path) => LabelMap::from_file(path)?,
                None => LabelMap::coco(),
            };
            info!("Loading detection model: {}", model_path.display());
            let detector = DetrDetector::load(&model_path, labels, threshold)?;
            info!("✓ Detection model ready");
            Ok(Arc::new(detector) as Arc<dyn ObjectDetector>)
        }))
    }

    /// Loader backed by an arbitrary constructor
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn ObjectDetector>> + Send + Sync + 'static,
    {
        Self {
            load_fn: Box::new(factory),
            detector: Mutex::new(None),
        }
    }

    /// Return the shared detector, loading it on the first call.
    /// A failed load is not cached; the next call tries again.
    pub fn load(&self) -> Result<Arc<dyn ObjectDetector>> {
        let mut guard = self
            .detector
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(detector) = guard.as_ref() {
            return Ok(detector.clone());
        }
        let detector = (self.load_fn)()?;
        *guard = Some(detector.clone());
        Ok(detector)
    }

    pub fn is_loaded(&self) -> bool {
        self.detector
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }
}
