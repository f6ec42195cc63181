use crate::config::CongestionThresholds;
use crate::models::{Detection, TrafficStatus};

/// Number of detections whose label is in `vehicle_labels`
pub fn count_vehicles(detections: &[Detection], vehicle_labels: &[String]) -> usize {
    detections
        .iter()
        .filter(|d| vehicle_labels.iter().any(|l| *l == d.label))
        .count()
}

/// Half-open breakpoints: `[0, moderate_at)` Clear, `[moderate_at, heavy_at)` Moderate,
/// `[heavy_at, ..)` Heavy
pub fn classify(vehicle_count: usize, thresholds: &CongestionThresholds) -> TrafficStatus {
    if vehicle_count < thresholds.moderate_at {
        TrafficStatus::Clear
    } else if vehicle_count < thresholds.heavy_at {
        TrafficStatus::Moderate
    } else {
        TrafficStatus::Heavy
    }
}
