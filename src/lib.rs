pub mod annotate;
pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod traffic;

pub use annotate::Annotator;
pub use config::{CongestionThresholds, ModelConfig, TrafficConfig};
pub use detection::{DetrDetector, LabelMap, ModelLoader, ObjectDetector};
pub use error::{Result, TrafficError};
pub use models::{Advisory, BoundingBox, Detection, DetectionSet, TrafficReport, TrafficStatus};
pub use pipeline::{PipelineContext, PipelineOutput, TrafficPipeline, DebugConfig};
pub use report::{ConsolePresenter, Presenter};

#[cfg(feature = "gui")]
pub mod gui;
