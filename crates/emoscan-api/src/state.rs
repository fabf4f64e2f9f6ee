//! Application state.

use std::sync::Arc;

use emoscan_media::{MediaResult, VideoAnalyzer};

use crate::config::ApiConfig;

/// Shared application state.
///
/// Constructed once at startup and cloned into handlers; the analyzer's
/// collaborators are injected here, which is also the seam tests use to
/// substitute fakes.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub analyzer: Arc<VideoAnalyzer>,
}

impl AppState {
    /// Create state with the production decoder and classifier.
    ///
    /// Fails when the detection or emotion model cannot be loaded.
    pub fn new(config: ApiConfig) -> MediaResult<Self> {
        let analyzer = VideoAnalyzer::with_onnx_classifier()?;
        Ok(Self {
            config,
            analyzer: Arc::new(analyzer),
        })
    }

    /// Create state with an injected analyzer.
    pub fn with_analyzer(config: ApiConfig, analyzer: Arc<VideoAnalyzer>) -> Self {
        Self { config, analyzer }
    }
}
