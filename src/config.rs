use crate::error::{Result, TrafficError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;
pub const DEFAULT_MODERATE_AT: usize = 5;
pub const DEFAULT_HEAVY_AT: usize = 15;
pub const DEFAULT_CHECKPOINT: &str = "detr-resnet-50";
pub const CONFIG_ENV_VAR: &str = "TRAFFIC_CHECK_CONFIG";

const DEFAULT_VEHICLE_LABELS: [&str; 4] = ["car", "truck", "bus", "motorcycle"];
const DEFAULT_EMERGENCY_LABELS: [&str; 1] = ["ambulance"];

/// Count breakpoints: `count < moderate_at` is Clear, `count >= heavy_at` is Heavy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CongestionThresholds {
    pub moderate_at: usize,
    pub heavy_at: usize,
}

impl Default for CongestionThresholds {
    fn default() -> Self {
        Self {
            moderate_at: DEFAULT_MODERATE_AT,
            heavy_at: DEFAULT_HEAVY_AT,
        }
    }
}

/// Detector settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// `.rten` checkpoint; defaults to the cached `detr-resnet-50` export
    pub path: Option<PathBuf>,
    /// Label vocabulary, one per line, line index = class id
    pub labels_path: Option<PathBuf>,
    pub confidence_threshold: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: None,
            labels_path: None,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

impl ModelConfig {
    /// Configured checkpoint path, or `~/.cache/traffic-check/detr-resnet-50.rten`
    pub fn checkpoint_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        let home_dir = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| TrafficError::ModelLoad {
                path: PathBuf::from(format!("{}.rten", DEFAULT_CHECKPOINT)),
                reason: "no model path configured and HOME is not set".to_string(),
            })?;
        Ok(Path::new(&home_dir)
            .join(".cache/traffic-check")
            .join(format!("{}.rten", DEFAULT_CHECKPOINT)))
    }
}

/// All tunable values of the analysis, with documented defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficConfig {
    pub model: ModelConfig,
    pub congestion: CongestionThresholds,
    pub vehicle_labels: Vec<String>,
    /// Inert with the default COCO vocabulary, which has no "ambulance"
    pub emergency_labels: Vec<String>,
    /// TrueType font for box captions
    pub font_path: Option<PathBuf>,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            congestion: CongestionThresholds::default(),
            vehicle_labels: DEFAULT_VEHICLE_LABELS.iter().map(|s| s.to_string()).collect(),
            emergency_labels: DEFAULT_EMERGENCY_LABELS.iter().map(|s| s.to_string()).collect(),
            font_path: None,
        }
    }
}

impl TrafficConfig {
    /// Load from `path`, or from `$TRAFFIC_CHECK_CONFIG`, or fall back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from);
        match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            TrafficError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&raw)
            .map_err(|e| TrafficError::Config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|e| TrafficError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let confidence = self.model.confidence_threshold;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(TrafficError::Config(format!(
                "confidence threshold must be within [0, 1], got {}",
                confidence
            )));
        }
        if self.congestion.moderate_at >= self.congestion.heavy_at {
            return Err(TrafficError::Config(format!(
                "moderate_at ({}) must be below heavy_at ({})",
                self.congestion.moderate_at, self.congestion.heavy_at
            )));
        }
        if self.vehicle_labels.is_empty() {
            return Err(TrafficError::Config("vehicle label set is empty".to_string()));
        }
        Ok(())
    }

    pub fn is_vehicle(&self, label: &str) -> bool {
        self.vehicle_labels.iter().any(|l| l == label)
    }

    pub fn is_emergency(&self, label: &str) -> bool {
        self.emergency_labels.iter().any(|l| l == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = TrafficConfig::default();
        assert_eq!(config.model.confidence_threshold, 0.7);
        assert_eq!(config.congestion.moderate_at, 5);
        assert_eq!(config.congestion.heavy_at, 15);
        assert!(config.is_vehicle("motorcycle"));
        assert!(!config.is_vehicle("person"));
        assert!(config.is_emergency("ambulance"));
        assert!(!config.is_emergency("Ambulance"));
    }

    #[test]
    fn partial_toml_keeps_defaults() -> anyhow::Result<()> {
        let config = TrafficConfig::from_toml(
            r#"
            emergency_labels = ["ambulance", "fire truck"]

            [congestion]
            heavy_at = 20
            "#,
        )?;
        assert_eq!(config.congestion.moderate_at, 5);
        assert_eq!(config.congestion.heavy_at, 20);
        assert_eq!(config.model.confidence_threshold, 0.7);
        assert!(config.is_emergency("fire truck"));
        Ok(())
    }

    #[test]
    fn rejects_inverted_breakpoints() {
        let result = TrafficConfig::from_toml(
            r#"
            [congestion]
            moderate_at = 15
            heavy_at = 5
            "#,
        );
        assert!(matches!(result, Err(TrafficError::Config(_))));
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let result = TrafficConfig::from_toml(
            r#"
            [model]
            confidence_threshold = 1.5
            "#,
        );
        assert!(matches!(result, Err(TrafficError::Config(_))));
    }

    #[test]
    fn explicit_model_path_wins() -> anyhow::Result<()> {
        let model = ModelConfig {
            path: Some(PathBuf::from("/models/custom.rten")),
            ..Default::default()
        };
        assert_eq!(model.checkpoint_path()?, PathBuf::from("/models/custom.rten"));
        Ok(())
    }
}
