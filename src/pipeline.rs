use crate::annotate::Annotator;
use crate::config::TrafficConfig;
use crate::detection::{preprocessing, ObjectDetector};
use crate::error::{Result, TrafficError};
use crate::models::TrafficReport;
use crate::report;
use crate::traffic::{congestion, emergency};
use image::{ImageReader, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Upload extensions accepted by the front ends (compared case-insensitively)
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["jpg", "png", "jpeg"];

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
    /// Whether debug mode is enabled
    pub enabled: bool,
}

/// Context shared by every stage of a run
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub verbose: bool,
    pub debug: Option<DebugConfig>,
}

/// Result of one upload: the annotated copy plus everything derived from it
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub annotated: RgbImage,
    pub report: TrafficReport,
}

/// Reject files whose extension is not jpg, jpeg or png
pub fn validate_extension(path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(TrafficError::UnsupportedFormat(ext))
    }
}

/// Decode uploaded bytes into an RGB bitmap
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage> {
    if bytes.is_empty() {
        return Err(TrafficError::ImageDecode("upload is empty".to_string()));
    }
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| TrafficError::ImageDecode(e.to_string()))?
        .decode()?;
    Ok(img.to_rgb8())
}

/// A decoded image with no pixels cannot be run through any detector
pub fn ensure_not_empty(image: &RgbImage) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(TrafficError::Inference(format!(
            "image is empty ({}x{})",
            image.width(),
            image.height()
        )));
    }
    Ok(())
}

/// Load → detect → classify → annotate, for one image at a time.
///
/// The detector handle is injected so the same loaded model serves every
/// upload, and tests can swap in a stub.
pub struct TrafficPipeline {
    detector: Arc<dyn ObjectDetector>,
    config: TrafficConfig,
    annotator: Annotator,
    context: PipelineContext,
}

impl TrafficPipeline {
    pub fn new(detector: Arc<dyn ObjectDetector>, config: TrafficConfig) -> Self {
        let annotator = Annotator::new(&config);
        Self::with_annotator(detector, config, annotator)
    }

    pub fn with_annotator(
        detector: Arc<dyn ObjectDetector>,
        config: TrafficConfig,
        annotator: Annotator,
    ) -> Self {
        if emergency::is_inert(detector.labels(), &config.emergency_labels) {
            debug!(
                detector = detector.name(),
                "vocabulary has no emergency label; emergency flag will stay off"
            );
        }
        Self {
            detector,
            config,
            annotator,
            context: PipelineContext::default(),
        }
    }

    /// Enable verbose output
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.context.verbose = verbose;
        self
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(TrafficError::Config(format!(
                    "debug directory is not empty: {}",
                    output_dir.display()
                )));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig {
            output_dir,
            enabled: true,
        });

        Ok(self)
    }

    pub fn config(&self) -> &TrafficConfig {
        &self.config
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// Detection and classification only; no image is produced
    pub fn analyze(&self, image: &RgbImage) -> Result<TrafficReport> {
        ensure_not_empty(image)?;
        let detections = self.detector.detect(image)?;
        info!("{} detections above threshold", detections.len());

        if self.context.verbose {
            for d in &detections {
                info!(
                    "  {} {:.2} at ({:.2}, {:.2}) - ({:.2}, {:.2})",
                    d.label, d.confidence, d.bbox.x1, d.bbox.y1, d.bbox.x2, d.bbox.y2
                );
            }
        }

        let vehicle_count = congestion::count_vehicles(&detections, &self.config.vehicle_labels);
        let status = congestion::classify(vehicle_count, &self.config.congestion);
        let emergency = emergency::emergency_detected(&detections, &self.config.emergency_labels);
        if emergency {
            warn!("Emergency vehicle detected");
        }

        Ok(TrafficReport {
            detections,
            vehicle_count,
            status,
            emergency,
            advisories: report::advisories(status, emergency),
        })
    }

    /// Full run on an already decoded image
    pub fn run_image(&self, image: &RgbImage) -> Result<PipelineOutput> {
        ensure_not_empty(image)?;
        self.save_debug_image("00_input", image)?;
        if self.debug_enabled() {
            let model_input = preprocessing::resize_for_model(image);
            self.save_debug_image("01_model_input", &model_input)?;
        }

        let report = self.analyze(image)?;
        let annotated = self.annotator.annotate(image, &report.detections);
        self.save_debug_image("02_annotated", &annotated)?;

        info!(
            "Traffic status: {} ({} vehicles)",
            report.status, report.vehicle_count
        );
        Ok(PipelineOutput { annotated, report })
    }

    /// Full run on raw upload bytes
    pub fn run(&self, bytes: &[u8]) -> Result<PipelineOutput> {
        let image = decode_image(bytes)?;
        debug!("Image decoded: {}x{}", image.width(), image.height());
        self.run_image(&image)
    }

    fn debug_enabled(&self) -> bool {
        self.context.debug.as_ref().is_some_and(|d| d.enabled)
    }

    fn save_debug_image(&self, step_dir_name: &str, image: &RgbImage) -> Result<()> {
        let Some(debug_config) = self.context.debug.as_ref().filter(|d| d.enabled) else {
            return Ok(());
        };

        let step_dir = debug_config.output_dir.join(step_dir_name);
        std::fs::create_dir_all(&step_dir)?;
        let output_path = step_dir.join("01.png");
        image.save(&output_path).map_err(|e| {
            std::io::Error::other(format!(
                "failed to save debug image {}: {}",
                output_path.display(),
                e
            ))
        })?;

        debug!("Debug: saved {}/01.png", step_dir_name);
        Ok(())
    }
}
