//! Emotion score distributions.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Emotion categories produced by the classifier, in model output order.
pub const EMOTION_LABELS: [&str; 7] = [
    "angry", "disgust", "fear", "happy", "sad", "surprise", "neutral",
];

/// Dominant-emotion value emitted when a sampled frame contains no face.
pub const NO_FACE_SENTINEL: &str = "no_face_detected";

/// Round a score to two decimal places.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Per-face emotion distribution: a percentage score per category plus the
/// highest-scoring label.
///
/// Keys are stored in a `BTreeMap` so serialized output has a stable order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionScores {
    /// Highest-scoring emotion label
    pub dominant: String,
    /// Emotion label -> percentage score
    pub scores: BTreeMap<String, f64>,
}

impl EmotionScores {
    /// Create from an explicit dominant label and score map.
    pub fn new(dominant: impl Into<String>, scores: BTreeMap<String, f64>) -> Self {
        Self {
            dominant: dominant.into(),
            scores,
        }
    }

    /// Create from a score map, deriving the dominant label as the argmax.
    ///
    /// Ties resolve to the alphabetically first label; an empty map yields
    /// an empty dominant label (callers treat that as no face).
    pub fn from_scores(scores: BTreeMap<String, f64>) -> Self {
        let dominant = scores
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(label, _)| label.clone())
            .unwrap_or_default();
        Self { dominant, scores }
    }

    /// Return a copy with every score rounded to two decimal places.
    pub fn rounded(&self) -> Self {
        Self {
            dominant: self.dominant.clone(),
            scores: self
                .scores
                .iter()
                .map(|(label, score)| (label.clone(), round2(*score)))
                .collect(),
        }
    }
}

impl fmt::Display for EmotionScores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dominant)
    }
}
