//! Emergency-vehicle flag.
//!
//! The stock COCO vocabulary has no "ambulance" class, so with the default
//! checkpoint this check never fires. It stays as the hook for custom models
//! whose vocabulary carries one of the configured emergency labels.

use crate::detection::LabelMap;
use crate::models::Detection;

/// True iff some detection label exactly equals one of `emergency_labels`
pub fn emergency_detected(detections: &[Detection], emergency_labels: &[String]) -> bool {
    detections
        .iter()
        .any(|d| emergency_labels.iter().any(|l| *l == d.label))
}

/// True when the vocabulary cannot produce any emergency label
pub fn is_inert(labels: &LabelMap, emergency_labels: &[String]) -> bool {
    !emergency_labels.iter().any(|l| labels.contains(l))
}
