//! Emotion classification.
//!
//! [`EmotionClassifier`] is the collaborator seam the analyzer talks to;
//! the production implementation combines YuNet face detection with an
//! ONNX emotion model.

#[cfg(feature = "opencv")]
pub mod onnx;
#[cfg(feature = "opencv")]
pub mod yunet;

use emoscan_models::EmotionScores;

use crate::error::MediaResult;
use crate::frame::Frame;

/// Classifies facial emotions in one frame.
///
/// The contract is tolerant and quiet: a frame with no detectable face is a
/// successful empty result, not an error, and diagnostics stay at debug
/// level. `Err` is reserved for internal classifier failures.
pub trait EmotionClassifier: Send + Sync {
    /// Per-face emotion distributions, ordered by detection confidence.
    fn classify(&self, frame: &Frame) -> MediaResult<Vec<EmotionScores>>;
}
