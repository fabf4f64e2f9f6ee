//! Shared data models for the EmoScan backend.
//!
//! This crate provides Serde-serializable types for:
//! - Per-face emotion score distributions
//! - Per-second frame records (the analysis timeline)
//! - The analysis response payload

pub mod analysis;
pub mod emotion;

// Re-export common types
pub use analysis::{FrameOutcome, FrameRecord, VideoAnalysis};
pub use emotion::{round2, EmotionScores, EMOTION_LABELS, NO_FACE_SENTINEL};
