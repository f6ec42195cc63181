use crate::error::{Result, TrafficError};
use std::path::Path;

/// COCO vocabulary of the `detr-resnet-50` checkpoint, indexed by class id.
/// Ids that COCO skips are "N/A". There is no "ambulance" here.
pub const COCO_LABELS: [&str; 91] = [
    "N/A", "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "N/A", "stop sign", "parking meter", "bench", "bird", "cat",
    "dog", "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "N/A", "backpack",
    "umbrella", "N/A", "N/A", "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard",
    "sports ball", "kite", "baseball bat", "baseball glove", "skateboard", "surfboard",
    "tennis racket", "bottle", "N/A", "wine glass", "cup", "fork", "knife", "spoon", "bowl",
    "banana", "apple", "sandwich", "orange", "broccoli", "carrot", "hot dog", "pizza", "donut",
    "cake", "chair", "couch", "potted plant", "bed", "N/A", "dining table", "N/A", "N/A",
    "toilet", "N/A", "tv", "laptop", "mouse", "remote", "keyboard", "cell phone", "microwave",
    "oven", "toaster", "sink", "refrigerator", "N/A", "book", "clock", "vase", "scissors",
    "teddy bear", "hair drier", "toothbrush",
];

/// Maps model class ids to label names
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMap {
    labels: Vec<String>,
}

impl LabelMap {
    pub fn coco() -> Self {
        Self::from_labels(COCO_LABELS.iter().map(|s| s.to_string()).collect())
    }

    pub fn from_labels(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// One label per line; blank lines are kept so ids stay aligned
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| TrafficError::ModelLoad {
            path: path.to_path_buf(),
            reason: format!("failed to read label file: {}", e),
        })?;
        let labels: Vec<String> = raw.lines().map(|l| l.trim().to_string()).collect();
        if labels.iter().all(|l| l.is_empty()) {
            return Err(TrafficError::ModelLoad {
                path: path.to_path_buf(),
                reason: "label file is empty".to_string(),
            });
        }
        Ok(Self::from_labels(labels))
    }

    pub fn name(&self, class_id: usize) -> String {
        match self.labels.get(class_id) {
            Some(label) if !label.is_empty() => label.clone(),
            _ => format!("LABEL_{}", class_id),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

impl Default for LabelMap {
    fn default() -> Self {
        Self::coco()
    }
}
