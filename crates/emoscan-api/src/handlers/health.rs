//! Service status handler.

use axum::Json;
use serde::Serialize;

/// Fixed text returned by the service root.
pub const READY_MESSAGE: &str = "Emotion analysis API ready for use!";

/// Root route response.
#[derive(Serialize)]
pub struct ReadyResponse {
    pub message: String,
}

/// Service root: fixed ready-status message, no side effects.
pub async fn ready() -> Json<ReadyResponse> {
    Json(ReadyResponse {
        message: READY_MESSAGE.to_string(),
    })
}
