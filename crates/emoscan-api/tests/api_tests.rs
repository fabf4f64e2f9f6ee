//! API integration tests.
//!
//! The router runs against fake decoder/classifier collaborators, so no
//! video files or model downloads are needed.

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use emoscan_api::{create_router, ApiConfig, AppState};
use emoscan_media::{
    EmotionClassifier, Frame, FrameSource, MediaError, MediaResult, VideoAnalyzer, VideoOpener,
};
use emoscan_models::EmotionScores;

struct FakeSource {
    fps: f64,
    remaining: usize,
}

impl FrameSource for FakeSource {
    fn frame_rate(&self) -> f64 {
        self.fps
    }

    fn read_frame(&mut self) -> MediaResult<Option<Frame>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(Frame::from_bgr8(2, 2, vec![0u8; 12]).unwrap()))
    }
}

struct FakeOpener {
    fps: f64,
    frames: usize,
    fail_open: bool,
    opens: AtomicUsize,
}

impl FakeOpener {
    fn new(fps: f64, frames: usize) -> Self {
        Self {
            fps,
            frames,
            fail_open: false,
            opens: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        let mut opener = Self::new(30.0, 0);
        opener.fail_open = true;
        opener
    }
}

impl VideoOpener for FakeOpener {
    fn open(&self, path: &Path) -> MediaResult<Box<dyn FrameSource>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.fail_open {
            return Err(MediaError::open_failed(path));
        }
        Ok(Box::new(FakeSource {
            fps: self.fps,
            remaining: self.frames,
        }))
    }
}

/// Classifier replaying one scripted outcome per sampled frame.
struct ScriptedClassifier {
    script: Mutex<VecDeque<MediaResult<Vec<EmotionScores>>>>,
}

impl ScriptedClassifier {
    fn new(script: Vec<MediaResult<Vec<EmotionScores>>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }
}

impl EmotionClassifier for ScriptedClassifier {
    fn classify(&self, _frame: &Frame) -> MediaResult<Vec<EmotionScores>> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

fn happy(score: f64) -> EmotionScores {
    let mut scores = BTreeMap::new();
    scores.insert("happy".to_string(), score);
    scores.insert("neutral".to_string(), 100.0 - score);
    EmotionScores::from_scores(scores)
}

fn test_app(
    video_path: PathBuf,
    opener: Arc<FakeOpener>,
    classifier: Arc<ScriptedClassifier>,
) -> Router {
    let config = ApiConfig {
        video_path,
        ..ApiConfig::default()
    };
    let analyzer = Arc::new(VideoAnalyzer::new(opener, classifier));
    create_router(AppState::with_analyzer(config, analyzer))
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// The root route always returns the fixed ready-status object.
#[tokio::test]
async fn test_root_route_returns_ready_message() {
    let app = test_app(
        PathBuf::from("video_input.mp4"),
        Arc::new(FakeOpener::new(30.0, 0)),
        Arc::new(ScriptedClassifier::new(vec![])),
    );

    let (status, body) = get_json(app.clone(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({"message": "Emotion analysis API ready for use!"})
    );

    // Same response regardless of any other state
    let (status, body2) = get_json(app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body2, body);
}

/// A missing video path yields 404 before any decoder is opened.
#[tokio::test]
async fn test_missing_video_returns_404_without_opening_decoder() {
    let opener = Arc::new(FakeOpener::new(30.0, 90));
    let app = test_app(
        PathBuf::from("/no/such/video_input.mp4"),
        opener.clone(),
        Arc::new(ScriptedClassifier::new(vec![])),
    );

    let (status, body) = get_json(app, "/analyze-fixed-video").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("/no/such/video_input.mp4"));
    assert!(body.get("analysis").is_none());
    assert_eq!(opener.opens.load(Ordering::SeqCst), 0);
}

/// An existing file the decoder cannot open yields 500 naming the path.
#[tokio::test]
async fn test_unopenable_video_returns_500() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let app = test_app(
        file.path().to_path_buf(),
        Arc::new(FakeOpener::failing()),
        Arc::new(ScriptedClassifier::new(vec![])),
    );

    let (status, body) = get_json(app, "/analyze-fixed-video").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains(file.path().to_str().unwrap()));
    assert!(body.get("analysis").is_none());
}

/// A 3-second 30fps video with a smiling face yields 3 happy records.
#[tokio::test]
async fn test_happy_video_timeline_shape() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let app = test_app(
        file.path().to_path_buf(),
        Arc::new(FakeOpener::new(30.0, 90)),
        Arc::new(ScriptedClassifier::new(vec![
            Ok(vec![happy(82.512)]),
            Ok(vec![happy(90.0)]),
            Ok(vec![happy(77.256)]),
        ])),
    );

    let (status, body) = get_json(app, "/analyze-fixed-video").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["video"], file.path().to_str().unwrap());
    assert_eq!(body["output_json"], "analysis_results.json");

    let analysis = body["analysis"].as_array().unwrap();
    assert_eq!(analysis.len(), 3);
    for (i, record) in analysis.iter().enumerate() {
        assert_eq!(record["second"], i as u64);
        assert_eq!(record["dominant_emotion"], "happy");
        let total: f64 = record["emotions"]
            .as_object()
            .unwrap()
            .values()
            .map(|v| v.as_f64().unwrap())
            .sum();
        assert!((total - 100.0).abs() < 0.1, "scores sum to {total}");
    }

    // The output_json field is vestigial: nothing is written to disk.
    assert!(!Path::new("analysis_results.json").exists());
}

/// Per-frame classifier failures become error records; the run continues.
#[tokio::test]
async fn test_error_and_no_face_records() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let app = test_app(
        file.path().to_path_buf(),
        Arc::new(FakeOpener::new(30.0, 90)),
        Arc::new(ScriptedClassifier::new(vec![
            Ok(vec![happy(80.0)]),
            Err(MediaError::classification_failed("model exploded")),
            Ok(Vec::new()),
        ])),
    );

    let (status, body) = get_json(app, "/analyze-fixed-video").await;
    assert_eq!(status, StatusCode::OK);

    let analysis = body["analysis"].as_array().unwrap();
    assert_eq!(analysis.len(), 3);

    assert_eq!(analysis[0]["dominant_emotion"], "happy");

    assert!(analysis[1]["error"]
        .as_str()
        .unwrap()
        .contains("model exploded"));
    assert!(analysis[1].get("dominant_emotion").is_none());
    assert!(analysis[1].get("emotions").is_none());

    assert_eq!(analysis[2]["dominant_emotion"], "no_face_detected");
    assert_eq!(analysis[2]["emotions"], serde_json::json!({}));
}

/// CORS preflight succeeds under the development posture.
#[tokio::test]
async fn test_cors_preflight() {
    let app = test_app(
        PathBuf::from("video_input.mp4"),
        Arc::new(FakeOpener::new(30.0, 0)),
        Arc::new(ScriptedClassifier::new(vec![])),
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/analyze-fixed-video")
                .header("Origin", "http://localhost:3000")
                .header("Access-Control-Request-Method", "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(
        response.status() == StatusCode::OK || response.status() == StatusCode::NO_CONTENT,
        "unexpected preflight status {}",
        response.status()
    );
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}
