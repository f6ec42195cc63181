use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced to the user for a single upload attempt.
///
/// Nothing is recovered locally: a request either yields a full report or
/// one of these.
#[derive(Debug, Error)]
pub enum TrafficError {
    #[error("failed to load detection model from {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    #[error("failed to decode image: {0}")]
    ImageDecode(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("unsupported image format '{0}' (expected jpg, jpeg or png)")]
    UnsupportedFormat(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TrafficError>;

impl From<image::ImageError> for TrafficError {
    fn from(error: image::ImageError) -> Self {
        TrafficError::ImageDecode(error.to_string())
    }
}
