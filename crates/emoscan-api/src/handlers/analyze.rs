//! Fixed-video analysis handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use tracing::info;

use emoscan_models::VideoAnalysis;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Analyze the configured video and return the per-second emotion timeline.
///
/// The whole video is processed before any response bytes are produced; a
/// missing or unopenable file fails the request with 404/500 before any
/// frame is read. Per-frame classification failures appear as error records
/// inside the timeline, never as request failures.
pub async fn analyze_fixed_video(State(state): State<AppState>) -> ApiResult<Json<VideoAnalysis>> {
    let video_path = state.config.video_path.clone();
    let analyzer = Arc::clone(&state.analyzer);

    // The decode/classify loop is CPU-bound; run it off the async runtime.
    let records = tokio::task::spawn_blocking(move || analyzer.analyze(&video_path))
        .await
        .map_err(|e| ApiError::internal(format!("analysis task failed: {e}")))??;

    info!(
        video = %state.config.video_path.display(),
        records = records.len(),
        "analysis served"
    );

    Ok(Json(VideoAnalysis::new(
        state.config.video_path.display().to_string(),
        state.config.output_json_name.clone(),
        records,
    )))
}
