//! Video analysis orchestration.
//!
//! [`VideoAnalyzer`] wires the opener, sampler and classifier together:
//! open the configured video, sample one frame per second, classify each
//! sample and accumulate the per-second records.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use emoscan_models::FrameRecord;

use crate::classify::EmotionClassifier;
use crate::error::{MediaError, MediaResult};
use crate::sampler::SecondSampler;
use crate::source::VideoOpener;

/// Samples a video at one frame per second and classifies each sample.
///
/// Collaborators are injected so tests can run against fakes.
pub struct VideoAnalyzer {
    opener: Arc<dyn VideoOpener>,
    classifier: Arc<dyn EmotionClassifier>,
}

impl VideoAnalyzer {
    pub fn new(opener: Arc<dyn VideoOpener>, classifier: Arc<dyn EmotionClassifier>) -> Self {
        Self { opener, classifier }
    }

    /// Construct the production analyzer: OpenCV decoding plus the ONNX
    /// emotion classifier. Fails when either model cannot be loaded.
    #[cfg(feature = "opencv")]
    pub fn with_onnx_classifier() -> MediaResult<Self> {
        use crate::classify::onnx::OnnxEmotionClassifier;
        use crate::source::OpenCvOpener;

        Ok(Self::new(
            Arc::new(OpenCvOpener),
            Arc::new(OnnxEmotionClassifier::new()?),
        ))
    }

    /// Run the full per-second analysis of one video file.
    ///
    /// A missing file or an unopenable video fails the whole run before any
    /// frame is read. Per-frame classification failures are recorded
    /// in-band and never abort the run.
    pub fn analyze(&self, path: &Path) -> MediaResult<Vec<FrameRecord>> {
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }

        let source = self.opener.open(path)?;
        let fps = source.frame_rate();
        let mut sampler = SecondSampler::new(source);
        info!(
            video = %path.display(),
            fps,
            stride = sampler.stride(),
            "starting analysis"
        );

        let mut records = Vec::new();
        while let Some((second, frame)) = sampler.next_sample() {
            debug!(second, "analyzing sample");
            let record = match self.classifier.classify(&frame) {
                Ok(faces) => match faces.into_iter().next() {
                    Some(scores) => FrameRecord::emotions(second, scores.rounded()),
                    None => FrameRecord::no_face(second),
                },
                Err(e) => {
                    warn!(second, error = %e, "classification failed for sample");
                    FrameRecord::failed(second, format!("classification failed: {e}"))
                }
            };
            records.push(record);
        }

        info!(video = %path.display(), records = records.len(), "analysis complete");
        Ok(records)
    }
}
