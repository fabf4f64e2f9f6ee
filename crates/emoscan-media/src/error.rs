//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while decoding or classifying video.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Video file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Could not open video file: {path}. Check the path, the format (MP4, AVI, ...) and that the file is not corrupted")]
    OpenFailed { path: PathBuf },

    #[error("Frame decode failed: {0}")]
    DecodeFailed(String),

    #[error("Face detection failed: {0}")]
    DetectionFailed(String),

    #[error("Emotion classification failed: {0}")]
    ClassificationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an open failure error for a path.
    pub fn open_failed(path: impl Into<PathBuf>) -> Self {
        Self::OpenFailed { path: path.into() }
    }

    /// Create a decode failure error.
    pub fn decode_failed(message: impl Into<String>) -> Self {
        Self::DecodeFailed(message.into())
    }

    /// Create a detection failure error.
    pub fn detection_failed(message: impl Into<String>) -> Self {
        Self::DetectionFailed(message.into())
    }

    /// Create a classification failure error.
    pub fn classification_failed(message: impl Into<String>) -> Self {
        Self::ClassificationFailed(message.into())
    }

    /// Create a model not found error.
    pub fn model_not_found(message: impl Into<String>) -> Self {
        Self::ModelNotFound(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
