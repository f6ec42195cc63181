use crate::error::{Result, TrafficError};
use crate::models::{Advisory, TrafficReport, TrafficStatus};
use image::RgbImage;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Advisories for a status and emergency flag, in display order
pub fn advisories(status: TrafficStatus, emergency: bool) -> Vec<Advisory> {
    let mut advisories = Vec::new();
    if status == TrafficStatus::Heavy {
        advisories.push(Advisory::CongestionWarning);
        advisories.push(Advisory::RerouteSuggestion);
    }
    if emergency {
        advisories.push(Advisory::EmergencyAlert);
    }
    advisories
}

pub fn status_line(report: &TrafficReport) -> String {
    format!("Traffic Status: {}", report.status)
}

pub fn count_line(report: &TrafficReport) -> String {
    format!("Detected Vehicles: {}", report.vehicle_count)
}

/// Plain-text rendering of a report
pub fn render_text(report: &TrafficReport, verbose: bool) -> String {
    let mut lines = vec![status_line(report), count_line(report)];

    for advisory in &report.advisories {
        lines.push(format!("[{}] {}", advisory.level(), advisory.message()));
    }

    if verbose && !report.detections.is_empty() {
        lines.push(String::new());
        lines.push("Detections:".to_string());
        for d in &report.detections {
            lines.push(format!(
                "  {} {:.2} at ({:.2}, {:.2}, {:.2}, {:.2})",
                d.label, d.confidence, d.bbox.x1, d.bbox.y1, d.bbox.x2, d.bbox.y2
            ));
        }
    }

    lines.join("\n")
}

pub fn render_json(report: &TrafficReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(|e| TrafficError::Io(e.into()))
}

/// Final stage: shows one analysed upload to the user
pub trait Presenter {
    fn present(&mut self, annotated: &RgbImage, report: &TrafficReport) -> Result<()>;
}

/// Writes the report to a text sink and, optionally, the annotated image to disk
pub struct ConsolePresenter<W: Write> {
    out: W,
    json: bool,
    verbose: bool,
    image_output: Option<PathBuf>,
}

impl<W: Write> ConsolePresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            json: false,
            verbose: false,
            image_output: None,
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_image_output(mut self, path: Option<PathBuf>) -> Self {
        self.image_output = path;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for ConsolePresenter<W> {
    fn present(&mut self, annotated: &RgbImage, report: &TrafficReport) -> Result<()> {
        if let Some(path) = &self.image_output {
            annotated.save(path).map_err(|e| {
                std::io::Error::other(format!("failed to save {}: {}", path.display(), e))
            })?;
            info!("Annotated image written to {}", path.display());
        }

        let rendered = if self.json {
            render_json(report)?
        } else {
            render_text(report, self.verbose)
        };
        writeln!(self.out, "{}", rendered)?;
        Ok(())
    }
}
