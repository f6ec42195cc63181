#![allow(dead_code, unused_imports)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from traffic_check for tests
pub use traffic_check::{
    Advisory, Annotator, BoundingBox, Detection, DetectionSet, LabelMap, ObjectDetector,
    TrafficConfig, TrafficError, TrafficPipeline, TrafficReport, TrafficStatus,
};
