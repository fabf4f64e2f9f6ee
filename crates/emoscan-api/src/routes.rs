//! API routes.

use axum::routing::get;
use axum::Router;

use crate::handlers::{analyze_fixed_video, ready};
use crate::middleware::{cors_layer, request_logging};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ready))
        .route("/analyze-fixed-video", get(analyze_fixed_video))
        .layer(axum::middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
