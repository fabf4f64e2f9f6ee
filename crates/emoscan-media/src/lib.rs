//! Video decoding and facial-emotion classification.
//!
//! This crate provides:
//! - Frame sources over OpenCV's VideoCapture
//! - Per-second frame sampling derived from the reported frame rate
//! - YuNet face detection and ONNX emotion scoring
//! - The analysis orchestration used by the HTTP layer

pub mod analyzer;
pub mod classify;
pub mod error;
pub mod frame;
pub mod sampler;
pub mod source;

pub use analyzer::VideoAnalyzer;
pub use classify::EmotionClassifier;
pub use error::{MediaError, MediaResult};
pub use frame::Frame;
pub use sampler::{stride_for_fps, SecondSampler, DEFAULT_FPS};
pub use source::{FrameSource, VideoOpener};

#[cfg(feature = "opencv")]
pub use classify::onnx::OnnxEmotionClassifier;
#[cfg(feature = "opencv")]
pub use source::OpenCvOpener;
