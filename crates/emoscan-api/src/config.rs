//! API configuration.

use std::path::PathBuf;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Video file analyzed by the fixed-video route
    pub video_path: PathBuf,
    /// Output filename echoed in responses; nothing is ever written to it
    pub output_json_name: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
            cors_origins: vec!["*".to_string()],
            video_path: PathBuf::from("video_input.mp4"),
            output_json_name: "analysis_results.json".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            video_path: std::env::var("VIDEO_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.video_path),
            output_json_name: std::env::var("OUTPUT_JSON_NAME").unwrap_or(defaults.output_json_name),
        }
    }
}
