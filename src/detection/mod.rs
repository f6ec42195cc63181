pub mod labels;
pub mod model;
pub mod postprocessing;
pub mod preprocessing;

use crate::error::Result;
use crate::models::DetectionSet;
use image::RgbImage;

pub use labels::LabelMap;
pub use model::{DetrDetector, ModelLoader};

/// Object detector seam; the pipeline only sees this trait so tests can
/// inject a stub instead of a real checkpoint.
///
/// Implementations must be safe to call from several threads at once: the
/// handle is shared read-only after loading.
pub trait ObjectDetector: Send + Sync {
    /// Detect objects in one RGB image. Every returned detection has a
    /// confidence at or above the detector's threshold and a box in the
    /// image's pixel coordinates.
    fn detect(&self, image: &RgbImage) -> Result<DetectionSet>;

    /// Human-readable name (used in log output)
    fn name(&self) -> &str;

    /// Class vocabulary the detector can emit
    fn labels(&self) -> &LabelMap;
}
