use serde::Serialize;
use std::fmt;

/// Box in original image pixel coordinates (top-left / bottom-right)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Round every coordinate to two decimal digits
    pub fn rounded(self) -> Self {
        Self {
            x1: round2(self.x1),
            y1: round2(self.y1),
            x2: round2(self.x2),
            y2: round2(self.y2),
        }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }
}

fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }
}

/// All detections for one image. Order carries no meaning.
pub type DetectionSet = Vec<Detection>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrafficStatus {
    Clear,
    Moderate,
    Heavy,
}

impl fmt::Display for TrafficStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrafficStatus::Clear => write!(f, "Clear"),
            TrafficStatus::Moderate => write!(f, "Moderate"),
            TrafficStatus::Heavy => write!(f, "Heavy Traffic"),
        }
    }
}

/// Conditional messages shown under the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Advisory {
    CongestionWarning,
    RerouteSuggestion,
    EmergencyAlert,
}

impl Advisory {
    pub fn message(&self) -> &'static str {
        match self {
            Advisory::CongestionWarning => "Traffic Jam Detected. Suggesting alternate route...",
            Advisory::RerouteSuggestion => "Please take the bypass road to save time.",
            Advisory::EmergencyAlert => "Ambulance detected! Grant emergency passage immediately.",
        }
    }

    /// Severity tag used by text and GUI presenters
    pub fn level(&self) -> &'static str {
        match self {
            Advisory::CongestionWarning => "WARNING",
            Advisory::RerouteSuggestion => "INFO",
            Advisory::EmergencyAlert => "ALERT",
        }
    }
}

/// Everything derived from one image, independent of any rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficReport {
    pub detections: DetectionSet,
    pub vehicle_count: usize,
    pub status: TrafficStatus,
    pub emergency: bool,
    pub advisories: Vec<Advisory>,
}
