//! OpenCV YuNet face detector.
//!
//! YuNet is a lightweight CNN face detector exposed via OpenCV's
//! FaceDetectorYN API. The model file is resolved from `YUNET_MODEL_PATH`
//! or a list of conventional locations.

use std::path::{Path, PathBuf};

use opencv::core::{Mat, Rect, Size};
use opencv::dnn::{DNN_BACKEND_DEFAULT, DNN_TARGET_CPU};
use opencv::objdetect::FaceDetectorYN;
use opencv::prelude::{FaceDetectorYNTrait, MatTraitConst};
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Model locations checked in order when `YUNET_MODEL_PATH` is unset.
const YUNET_MODEL_PATHS: &[&str] = &[
    "./models/face_detection_yunet_2023mar.onnx",
    "/app/models/face_detection_yunet_2023mar.onnx",
    "/usr/share/opencv/models/face_detection_yunet_2023mar.onnx",
];

/// Score threshold for face candidates.
const SCORE_THRESHOLD: f32 = 0.5;

/// NMS threshold for overlapping candidates.
const NMS_THRESHOLD: f32 = 0.3;

/// Maximum faces kept per frame.
const TOP_K: i32 = 5;

/// Locate the YuNet model file.
pub fn find_model_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("YUNET_MODEL_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }
    YUNET_MODEL_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

/// YuNet face detector bound to one loaded model.
pub struct YuNetDetector {
    detector: opencv::core::Ptr<FaceDetectorYN>,
}

impl YuNetDetector {
    /// Load the detector from the resolved model location.
    pub fn new() -> MediaResult<Self> {
        let model_path = find_model_path().ok_or_else(|| {
            MediaError::model_not_found(
                "YuNet face detection model; set YUNET_MODEL_PATH or place \
                 face_detection_yunet_2023mar.onnx under ./models",
            )
        })?;
        Self::with_model(&model_path)
    }

    /// Load the detector from a specific model file.
    pub fn with_model(model_path: &Path) -> MediaResult<Self> {
        let metadata = std::fs::metadata(model_path).map_err(|e| {
            MediaError::model_not_found(format!(
                "cannot read YuNet model {}: {e}",
                model_path.display()
            ))
        })?;
        if metadata.len() < 50_000 {
            return Err(MediaError::model_not_found(format!(
                "YuNet model {} looks corrupted ({} bytes)",
                model_path.display(),
                metadata.len()
            )));
        }

        let model_str = model_path
            .to_str()
            .ok_or_else(|| MediaError::model_not_found("non-UTF8 YuNet model path"))?;

        // Input size is set per frame before detection.
        let detector = FaceDetectorYN::create(
            model_str,
            "",
            Size::new(320, 320),
            SCORE_THRESHOLD,
            NMS_THRESHOLD,
            TOP_K,
            DNN_BACKEND_DEFAULT,
            DNN_TARGET_CPU,
        )
        .map_err(|e| MediaError::detection_failed(format!("YuNet create: {e}")))?;

        debug!(model = %model_path.display(), "YuNet detector initialized");
        Ok(Self { detector })
    }

    /// Detect faces in a BGR frame.
    ///
    /// Returns pixel-space boxes with confidence, highest confidence first.
    pub fn detect(&mut self, frame: &Mat) -> MediaResult<Vec<(Rect, f32)>> {
        if frame.empty() {
            return Ok(Vec::new());
        }
        let frame_width = frame.cols();
        let frame_height = frame.rows();

        self.detector
            .set_input_size(Size::new(frame_width, frame_height))
            .map_err(|e| MediaError::detection_failed(format!("YuNet input size: {e}")))?;

        let mut faces = Mat::default();
        self.detector
            .detect(frame, &mut faces)
            .map_err(|e| MediaError::detection_failed(format!("YuNet detect: {e}")))?;

        parse_detections(&faces, frame_width, frame_height)
    }
}

/// Parse the YuNet output matrix into clamped face boxes.
///
/// Each row is `[x, y, w, h, <5 landmark pairs>, score]`.
fn parse_detections(faces: &Mat, frame_width: i32, frame_height: i32) -> MediaResult<Vec<(Rect, f32)>> {
    let rows = faces.rows();
    if rows <= 0 {
        return Ok(Vec::new());
    }
    if faces.cols() < 15 {
        return Err(MediaError::detection_failed(format!(
            "unexpected YuNet output: {} columns",
            faces.cols()
        )));
    }

    let mut results = Vec::with_capacity(rows as usize);
    for i in 0..rows {
        let at = |col: i32| -> MediaResult<f32> {
            faces
                .at_2d::<f32>(i, col)
                .copied()
                .map_err(|e| MediaError::detection_failed(format!("YuNet output read: {e}")))
        };

        let x = at(0)?;
        let y = at(1)?;
        let w = at(2)?;
        let h = at(3)?;
        let score = at(14)?;

        if w <= 0.0 || h <= 0.0 || score < SCORE_THRESHOLD {
            continue;
        }

        // Clamp to frame bounds; YuNet can overshoot near edges.
        let x0 = x.max(0.0).round() as i32;
        let y0 = y.max(0.0).round() as i32;
        let x1 = ((x + w).min(frame_width as f32)).round() as i32;
        let y1 = ((y + h).min(frame_height as f32)).round() as i32;
        if x1 <= x0 || y1 <= y0 {
            continue;
        }

        results.push((Rect::new(x0, y0, x1 - x0, y1 - y0), score));
    }

    results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    debug!(faces = results.len(), "YuNet detections");
    Ok(results)
}
