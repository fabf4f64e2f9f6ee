//! Axum HTTP API server.
//!
//! This crate provides:
//! - The two-route emotion analysis API (root status + fixed-video analysis)
//! - Development CORS posture and request logging
//! - Env-driven configuration

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
