use crate::config::TrafficConfig;
use crate::models::Detection;
use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub const VEHICLE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const EMERGENCY_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const VEHICLE_THICKNESS: u32 = 2;
pub const EMERGENCY_THICKNESS: u32 = 3;
const TEXT_SCALE: f32 = 14.0;

const SYSTEM_FONTS: [&str; 6] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Draws detection boxes and captions onto a copy of the image
///
/// Cloning shares the parsed font, so one annotator can serve many pipelines.
#[derive(Clone)]
pub struct Annotator {
    font: Option<Arc<FontVec>>,
    vehicle_labels: Vec<String>,
    emergency_labels: Vec<String>,
}

impl Annotator {
    /// Annotator using the configured font, or the first system font found
    pub fn new(config: &TrafficConfig) -> Self {
        let font = load_font(config.font_path.as_deref());
        if font.is_none() {
            warn!("No TrueType font found; boxes will be drawn without captions");
        }
        Self::with_font(config, font)
    }

    pub fn with_font(config: &TrafficConfig, font: Option<FontVec>) -> Self {
        Self {
            font: font.map(Arc::new),
            vehicle_labels: config.vehicle_labels.clone(),
            emergency_labels: config.emergency_labels.clone(),
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Return an annotated copy; `image` and `detections` are left untouched.
    ///
    /// Vehicles get a thin red box captioned with label and score, emergency
    /// vehicles a thicker blue box. Other labels are not drawn.
    pub fn annotate(&self, image: &RgbImage, detections: &[Detection]) -> RgbImage {
        let mut canvas = image.clone();

        for detection in detections {
            if self.vehicle_labels.iter().any(|l| *l == detection.label) {
                let caption = format!("{} {:.2}", detection.label, detection.confidence);
                let style = (VEHICLE_COLOR, VEHICLE_THICKNESS);
                self.draw_box(&mut canvas, detection, style, &caption);
            }
            if self.emergency_labels.iter().any(|l| *l == detection.label) {
                let caption = capitalize(&detection.label);
                let style = (EMERGENCY_COLOR, EMERGENCY_THICKNESS);
                self.draw_box(&mut canvas, detection, style, &caption);
            }
        }

        canvas
    }

    fn draw_box(
        &self,
        canvas: &mut RgbImage,
        detection: &Detection,
        (color, thickness): (Rgb<u8>, u32),
        caption: &str,
    ) {
        let bbox = &detection.bbox;
        let x = bbox.x1.floor() as i32;
        let y = bbox.y1.floor() as i32;
        let width = bbox.width().round() as i32 + 1;
        let height = bbox.height().round() as i32 + 1;

        // Grow the outline inwards, one pixel per ring
        for i in 0..thickness as i32 {
            let w = width - 2 * i;
            let h = height - 2 * i;
            if w <= 0 || h <= 0 {
                break;
            }
            let ring = Rect::at(x + i, y + i).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(canvas, ring, color);
        }

        if let Some(font) = &self.font {
            let scale = PxScale::from(TEXT_SCALE);
            draw_text_mut(canvas, color, x, y, scale, &**font, caption);
        }
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn load_font(configured: Option<&Path>) -> Option<FontVec> {
    let candidates: Vec<PathBuf> = match configured {
        Some(path) => vec![path.to_path_buf()],
        None => SYSTEM_FONTS.iter().map(PathBuf::from).collect(),
    };

    for path in candidates {
        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        match FontVec::try_from_vec(bytes) {
            Ok(font) => {
                debug!(path = %path.display(), "caption font loaded");
                return Some(font);
            }
            Err(e) => warn!(path = %path.display(), "invalid font: {}", e),
        }
    }
    None
}
