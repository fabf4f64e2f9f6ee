//! Analysis timeline data models.
//!
//! A [`FrameRecord`] is one observation per sampled second. The legacy wire
//! format uses three shapes for the same array element:
//!
//! - `{"second": n, "dominant_emotion": "...", "emotions": {...}}`
//! - `{"second": n, "dominant_emotion": "no_face_detected", "emotions": {}}`
//! - `{"second": n, "error": "..."}`
//!
//! Internally the three cases are an explicit [`FrameOutcome`] taxonomy;
//! serialization maps the taxonomy onto the legacy shapes.

use std::collections::BTreeMap;

use serde::de::Error as DeError;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::emotion::{EmotionScores, NO_FACE_SENTINEL};

/// Outcome of classifying one sampled frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// At least one face was detected; scores are for the first face.
    Emotions(EmotionScores),
    /// The frame was classified successfully but contained no face.
    NoFace,
    /// The classifier raised for this frame; the run continues.
    Failed(String),
}

impl FrameOutcome {
    /// Returns true when the outcome carries emotion scores.
    pub fn is_emotions(&self) -> bool {
        matches!(self, Self::Emotions(_))
    }

    /// Returns true for the per-frame failure case.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// One emitted observation per sampled second.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    /// Zero-based second index
    pub second: u64,
    /// What classification produced for this second
    pub outcome: FrameOutcome,
}

impl FrameRecord {
    /// Record for a frame with at least one detected face.
    pub fn emotions(second: u64, scores: EmotionScores) -> Self {
        Self {
            second,
            outcome: FrameOutcome::Emotions(scores),
        }
    }

    /// Sentinel record for a frame with no detectable face.
    pub fn no_face(second: u64) -> Self {
        Self {
            second,
            outcome: FrameOutcome::NoFace,
        }
    }

    /// Record for a frame whose classification failed.
    pub fn failed(second: u64, error: impl Into<String>) -> Self {
        Self {
            second,
            outcome: FrameOutcome::Failed(error.into()),
        }
    }
}

impl Serialize for FrameRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.outcome {
            FrameOutcome::Emotions(e) => {
                let mut s = serializer.serialize_struct("FrameRecord", 3)?;
                s.serialize_field("second", &self.second)?;
                s.serialize_field("dominant_emotion", &e.dominant)?;
                s.serialize_field("emotions", &e.scores)?;
                s.end()
            }
            FrameOutcome::NoFace => {
                let mut s = serializer.serialize_struct("FrameRecord", 3)?;
                s.serialize_field("second", &self.second)?;
                s.serialize_field("dominant_emotion", NO_FACE_SENTINEL)?;
                s.serialize_field("emotions", &BTreeMap::<String, f64>::new())?;
                s.end()
            }
            FrameOutcome::Failed(error) => {
                let mut s = serializer.serialize_struct("FrameRecord", 2)?;
                s.serialize_field("second", &self.second)?;
                s.serialize_field("error", error)?;
                s.end()
            }
        }
    }
}

/// Raw wire shape accepted on input; the union of all three record forms.
#[derive(Deserialize)]
struct FrameRecordRepr {
    second: u64,
    #[serde(default)]
    dominant_emotion: Option<String>,
    #[serde(default)]
    emotions: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    error: Option<String>,
}

impl<'de> Deserialize<'de> for FrameRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = FrameRecordRepr::deserialize(deserializer)?;

        if let Some(error) = repr.error {
            return Ok(FrameRecord::failed(repr.second, error));
        }
        match repr.dominant_emotion {
            Some(dominant) if dominant == NO_FACE_SENTINEL => {
                Ok(FrameRecord::no_face(repr.second))
            }
            Some(dominant) => Ok(FrameRecord::emotions(
                repr.second,
                EmotionScores::new(dominant, repr.emotions.unwrap_or_default()),
            )),
            None => Err(D::Error::custom(
                "frame record has neither dominant_emotion nor error",
            )),
        }
    }
}

/// The analysis route's response payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalysis {
    /// Source video path
    pub video: String,
    /// Placeholder output filename; no file is ever written
    pub output_json: String,
    /// Per-second records in increasing-second order
    pub analysis: Vec<FrameRecord>,
}

impl VideoAnalysis {
    /// Create a payload from the accumulated records.
    pub fn new(
        video: impl Into<String>,
        output_json: impl Into<String>,
        analysis: Vec<FrameRecord>,
    ) -> Self {
        Self {
            video: video.into(),
            output_json: output_json.into(),
            analysis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn happy_scores() -> EmotionScores {
        EmotionScores::new(
            "happy",
            [("happy".to_string(), 82.56), ("sad".to_string(), 17.44)]
                .into_iter()
                .collect(),
        )
    }

    #[test]
    fn test_serialize_emotions_record() {
        let record = FrameRecord::emotions(3, happy_scores());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "second": 3,
                "dominant_emotion": "happy",
                "emotions": {"happy": 82.56, "sad": 17.44}
            })
        );
    }

    #[test]
    fn test_serialize_no_face_record() {
        let record = FrameRecord::no_face(0);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "second": 0,
                "dominant_emotion": "no_face_detected",
                "emotions": {}
            })
        );
    }

    #[test]
    fn test_serialize_failed_record_has_no_emotion_fields() {
        let record = FrameRecord::failed(7, "model exploded");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"second": 7, "error": "model exploded"}));
        assert!(value.get("dominant_emotion").is_none());
        assert!(value.get("emotions").is_none());
    }

    #[test]
    fn test_roundtrip_all_variants() {
        let records = vec![
            FrameRecord::emotions(0, happy_scores()),
            FrameRecord::no_face(1),
            FrameRecord::failed(2, "bad frame"),
        ];
        let text = serde_json::to_string(&records).unwrap();
        let back: Vec<FrameRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, records);
    }

    #[test]
    fn test_deserialize_rejects_shapeless_record() {
        let result: Result<FrameRecord, _> = serde_json::from_value(json!({"second": 1}));
        assert!(result.is_err());
    }

    #[test]
    fn test_video_analysis_payload_shape() {
        let payload = VideoAnalysis::new(
            "video_input.mp4",
            "analysis_results.json",
            vec![FrameRecord::no_face(0)],
        );
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["video"], "video_input.mp4");
        assert_eq!(value["output_json"], "analysis_results.json");
        assert_eq!(value["analysis"].as_array().unwrap().len(), 1);
    }
}
