use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use traffic_check::{
    Annotator, BoundingBox, Detection, DetectionSet, LabelMap, ObjectDetector, TrafficConfig,
    TrafficPipeline,
};

const VEHICLE_LABELS: [&str; 4] = ["car", "truck", "bus", "motorcycle"];

/// Detector returning a fixed set of detections, filtered by its threshold
pub struct StubDetector {
    detections: DetectionSet,
    labels: LabelMap,
    threshold: f32,
    calls: AtomicUsize,
}

impl StubDetector {
    pub fn new(detections: DetectionSet) -> Self {
        Self {
            detections,
            labels: LabelMap::coco(),
            threshold: 0.7,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_labels(mut self, labels: LabelMap) -> Self {
        self.labels = labels;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ObjectDetector for StubDetector {
    fn detect(&self, _image: &RgbImage) -> traffic_check::Result<DetectionSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .detections
            .iter()
            .filter(|d| d.confidence >= self.threshold)
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        "stub"
    }

    fn labels(&self) -> &LabelMap {
        &self.labels
    }
}

/// Small box laid out on a 10-wide grid by `index`
pub fn detection(label: &str, confidence: f32, index: usize) -> Detection {
    let x = (index % 10) as f32 * 6.0;
    let y = (index / 10) as f32 * 6.0;
    Detection::new(label, confidence, BoundingBox::new(x, y, x + 5.0, y + 5.0))
}

/// `n` confident detections cycling through the vehicle labels
pub fn vehicles(n: usize) -> DetectionSet {
    (0..n)
        .map(|i| detection(VEHICLE_LABELS[i % VEHICLE_LABELS.len()], 0.9, i))
        .collect()
}

/// Gradient image encoded as PNG bytes, as an upload would deliver it
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img: RgbImage = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 128])
    });
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png)
        .expect("Failed to encode test image");
    bytes.into_inner()
}

/// Pipeline over a stub detector, without caption fonts so output is deterministic
pub fn stub_pipeline(detections: DetectionSet) -> (TrafficPipeline, Arc<StubDetector>) {
    stub_pipeline_with(StubDetector::new(detections), TrafficConfig::default())
}

pub fn stub_pipeline_with(
    detector: StubDetector,
    config: TrafficConfig,
) -> (TrafficPipeline, Arc<StubDetector>) {
    let detector = Arc::new(detector);
    let annotator = Annotator::with_font(&config, None);
    let pipeline = TrafficPipeline::with_annotator(detector.clone(), config, annotator);
    (pipeline, detector)
}
