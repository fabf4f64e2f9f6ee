//! ONNX Runtime facial-emotion classifier.
//!
//! YuNet finds face boxes; each box is cropped, converted to a 48x48
//! grayscale tensor and scored by a FER-style expression model with seven
//! outputs in [`EMOTION_LABELS`] order. Raw model outputs are normalized
//! into percentage scores.
//!
//! Notes:
//! - OpenCV delivers frames as BGR; crops are grayscaled before inference.
//! - The session and detector sit behind mutexes so one classifier instance
//!   can serve the whole process.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use opencv::core::{Mat, Rect, Size};
use opencv::imgproc;
use opencv::prelude::MatTraitConstManual;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::debug;

use emoscan_models::{EmotionScores, EMOTION_LABELS};

use super::yunet::YuNetDetector;
use super::EmotionClassifier;
use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;

/// Model input edge length (FER-style models take square grayscale crops).
const INPUT_SIZE: i32 = 48;

/// Model locations checked in order when `EMOTION_MODEL_PATH` is unset.
const EMOTION_MODEL_PATHS: &[&str] = &[
    "./models/facial_expression.onnx",
    "/app/models/facial_expression.onnx",
    "/usr/share/emoscan/models/facial_expression.onnx",
];

/// Locate the emotion model file.
pub fn find_model_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("EMOTION_MODEL_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }
    EMOTION_MODEL_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

/// Production classifier: YuNet detection + ONNX expression scoring.
pub struct OnnxEmotionClassifier {
    detector: Mutex<YuNetDetector>,
    session: Mutex<Session>,
    output_name: String,
}

impl OnnxEmotionClassifier {
    /// Load detector and expression model from their resolved locations.
    pub fn new() -> MediaResult<Self> {
        let model_path = find_model_path().ok_or_else(|| {
            MediaError::model_not_found(
                "emotion model; set EMOTION_MODEL_PATH or place \
                 facial_expression.onnx under ./models",
            )
        })?;
        let detector = YuNetDetector::new()?;
        Self::with_parts(detector, &model_path)
    }

    /// Load with explicit model files (used by tooling and tests).
    pub fn with_models(yunet_model: &Path, emotion_model: &Path) -> MediaResult<Self> {
        let detector = YuNetDetector::with_model(yunet_model)?;
        Self::with_parts(detector, emotion_model)
    }

    fn with_parts(detector: YuNetDetector, emotion_model: &Path) -> MediaResult<Self> {
        let model_bytes = std::fs::read(emotion_model).map_err(|e| {
            MediaError::model_not_found(format!(
                "cannot read emotion model {}: {e}",
                emotion_model.display()
            ))
        })?;

        let session = Session::builder()
            .map_err(|e| MediaError::classification_failed(format!("ORT session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| MediaError::classification_failed(format!("ORT opt level: {e}")))?
            .commit_from_memory(model_bytes.as_slice())
            .map_err(|e| MediaError::classification_failed(format!("ORT load model: {e}")))?;

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| MediaError::classification_failed("emotion model has no outputs"))?;

        debug!(model = %emotion_model.display(), output = %output_name, "emotion model loaded");

        Ok(Self {
            detector: Mutex::new(detector),
            session: Mutex::new(session),
            output_name,
        })
    }

    /// Score one face crop.
    fn score_face(&self, frame: &Mat, face: Rect) -> MediaResult<EmotionScores> {
        let tensor = face_to_tensor(frame, face)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| MediaError::classification_failed("ORT session poisoned"))?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| MediaError::classification_failed(format!("ORT run failed: {e}")))?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| MediaError::classification_failed("ORT returned no outputs"))?;

        let (_, raw) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| MediaError::classification_failed(format!("ORT extract: {e}")))?;

        if raw.len() < EMOTION_LABELS.len() {
            return Err(MediaError::classification_failed(format!(
                "emotion model produced {} outputs, expected {}",
                raw.len(),
                EMOTION_LABELS.len()
            )));
        }

        let percentages = to_percentages(&raw[..EMOTION_LABELS.len()]);
        let scores = EMOTION_LABELS
            .iter()
            .zip(percentages)
            .map(|(label, score)| (label.to_string(), score))
            .collect();
        Ok(EmotionScores::from_scores(scores))
    }
}

impl EmotionClassifier for OnnxEmotionClassifier {
    fn classify(&self, frame: &Frame) -> MediaResult<Vec<EmotionScores>> {
        let mat = frame.to_mat()?;

        let faces = self
            .detector
            .lock()
            .map_err(|_| MediaError::detection_failed("detector poisoned"))?
            .detect(&mat)?;

        if faces.is_empty() {
            debug!("no face detected");
            return Ok(Vec::new());
        }

        let mut results = Vec::with_capacity(faces.len());
        for (rect, confidence) in faces {
            debug!(confidence, "scoring face");
            results.push(self.score_face(&mat, rect)?);
        }
        Ok(results)
    }
}

/// Crop a face box, grayscale it and pack a (1,1,48,48) tensor in [0,1].
fn face_to_tensor(frame: &Mat, face: Rect) -> MediaResult<Value> {
    let roi = Mat::roi(frame, face)
        .map_err(|e| MediaError::classification_failed(format!("face ROI: {e}")))?;

    let mut gray = Mat::default();
    imgproc::cvt_color(
        &roi,
        &mut gray,
        imgproc::COLOR_BGR2GRAY,
        0,
        opencv::core::AlgorithmHint::ALGO_HINT_DEFAULT,
    )
    .map_err(|e| MediaError::classification_failed(format!("BGR2GRAY: {e}")))?;

    let mut resized = Mat::default();
    imgproc::resize(
        &gray,
        &mut resized,
        Size::new(INPUT_SIZE, INPUT_SIZE),
        0.0,
        0.0,
        imgproc::INTER_AREA,
    )
    .map_err(|e| MediaError::classification_failed(format!("face resize: {e}")))?;

    let data = resized
        .data_typed::<u8>()
        .map_err(|e| MediaError::classification_failed(format!("face data: {e}")))?;

    let buf: Vec<f32> = data.iter().map(|&px| px as f32 / 255.0).collect();
    let shape = vec![1usize, 1, INPUT_SIZE as usize, INPUT_SIZE as usize];
    Tensor::from_array((shape, buf.into_boxed_slice()))
        .map(Value::from)
        .map_err(|e| MediaError::classification_failed(format!("ORT tensor: {e}")))
}

/// Normalize model outputs into percentages.
///
/// Expression heads differ between exports: some end in softmax, some emit
/// raw logits. Probability-shaped outputs are scaled by 100; anything else
/// goes through softmax first.
fn to_percentages(raw: &[f32]) -> Vec<f64> {
    let sum: f64 = raw.iter().map(|&v| v as f64).sum();
    let is_probability = raw.iter().all(|&v| (0.0..=1.0).contains(&v)) && (sum - 1.0).abs() < 1e-3;
    if is_probability {
        return raw.iter().map(|&v| v as f64 * 100.0).collect();
    }

    let max = raw.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f64> = raw.iter().map(|&v| ((v - max) as f64).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total * 100.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probability_outputs_scale_to_percent() {
        let p = to_percentages(&[0.1, 0.2, 0.7, 0.0, 0.0, 0.0, 0.0]);
        assert!((p[2] - 70.0).abs() < 1e-6);
        assert!((p.iter().sum::<f64>() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_logit_outputs_softmax_to_percent() {
        let p = to_percentages(&[2.0, 1.0, 0.5, -3.0, 0.0, 0.0, 0.0]);
        let total: f64 = p.iter().sum();
        assert!((total - 100.0).abs() < 1e-6);
        // Highest logit stays dominant after softmax
        let max_idx = p
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap()
            .0;
        assert_eq!(max_idx, 0);
    }

    #[test]
    fn test_uniform_logits_split_evenly() {
        let p = to_percentages(&[3.0; 7]);
        for v in &p {
            assert!((v - 100.0 / 7.0).abs() < 1e-6);
        }
    }
}
