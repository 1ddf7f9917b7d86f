//! Viseme timing data produced by phoneme analysis.
//!
//! The JSON shape mirrors what the phoneme tool writes:
//!
//! ```json
//! { "metadata": { "soundFile": "message_x.wav", "duration": 1.27 },
//!   "mouthCues": [ { "start": 0.0, "end": 0.05, "value": "X" } ] }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single mouth shape held between `start` and `end` seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisemeCue {
    pub start: f64,
    pub end: f64,
    /// Mouth shape label (e.g. `"A"`..`"H"`, `"X"` for rest).
    pub value: String,
}

impl VisemeCue {
    pub fn new(start: f64, end: f64, value: impl Into<String>) -> Self {
        Self {
            start,
            end,
            value: value.into(),
        }
    }
}

/// Information about the analyzed recording.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackMetadata {
    #[serde(rename = "soundFile", default, skip_serializing_if = "Option::is_none")]
    pub sound_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Why a set of cues is not a usable viseme track.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("viseme track is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("viseme track has no mouth cues")]
    Empty,

    #[error("cue {index} has a non-finite timestamp")]
    NonFinite { index: usize },

    #[error("cue {index} ends ({end}) before it starts ({start})")]
    Reversed { index: usize, start: f64, end: f64 },

    #[error("cue {index} starts at {start}, before the previous cue ({previous})")]
    OutOfOrder {
        index: usize,
        start: f64,
        previous: f64,
    },
}

/// Ordered, validated sequence of viseme cues.
///
/// Construction guarantees at least one cue, finite timestamps, non-decreasing
/// `start` times and `end >= start` for every cue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTrack")]
pub struct VisemeTrack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<TrackMetadata>,
    #[serde(rename = "mouthCues")]
    mouth_cues: Vec<VisemeCue>,
}

#[derive(Deserialize)]
struct RawTrack {
    #[serde(default)]
    metadata: Option<TrackMetadata>,
    #[serde(rename = "mouthCues")]
    mouth_cues: Vec<VisemeCue>,
}

impl TryFrom<RawTrack> for VisemeTrack {
    type Error = TrackError;

    fn try_from(raw: RawTrack) -> Result<Self, Self::Error> {
        let mut track = VisemeTrack::new(raw.mouth_cues)?;
        track.metadata = raw.metadata;
        Ok(track)
    }
}

impl VisemeTrack {
    /// Builds a track from cues, rejecting anything that cannot drive an animation.
    pub fn new(mouth_cues: Vec<VisemeCue>) -> Result<Self, TrackError> {
        validate(&mouth_cues)?;
        Ok(Self {
            metadata: None,
            mouth_cues,
        })
    }

    /// Parses the phoneme tool's JSON output.
    pub fn from_json(json: &str) -> Result<Self, TrackError> {
        let raw: RawTrack = serde_json::from_str(json)?;
        Self::try_from(raw)
    }

    pub fn with_metadata(mut self, metadata: TrackMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn metadata(&self) -> Option<&TrackMetadata> {
        self.metadata.as_ref()
    }

    pub fn cues(&self) -> &[VisemeCue] {
        &self.mouth_cues
    }

    pub fn len(&self) -> usize {
        self.mouth_cues.len()
    }

    /// Always false for a constructed track; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.mouth_cues.is_empty()
    }

    /// End time of the last cue, in seconds.
    pub fn duration(&self) -> f64 {
        self.mouth_cues.iter().map(|c| c.end).fold(0.0, f64::max)
    }
}

fn validate(cues: &[VisemeCue]) -> Result<(), TrackError> {
    if cues.is_empty() {
        return Err(TrackError::Empty);
    }

    let mut previous = f64::NEG_INFINITY;
    for (index, cue) in cues.iter().enumerate() {
        if !cue.start.is_finite() || !cue.end.is_finite() {
            return Err(TrackError::NonFinite { index });
        }
        if cue.end < cue.start {
            return Err(TrackError::Reversed {
                index,
                start: cue.start,
                end: cue.end,
            });
        }
        if cue.start < previous {
            return Err(TrackError::OutOfOrder {
                index,
                start: cue.start,
                previous,
            });
        }
        previous = cue.start;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RHUBARB_OUTPUT: &str = r#"{
      "metadata": { "soundFile": "audios/message_0.wav", "duration": 0.92 },
      "mouthCues": [
        { "start": 0.00, "end": 0.10, "value": "X" },
        { "start": 0.10, "end": 0.38, "value": "C" },
        { "start": 0.38, "end": 0.92, "value": "X" }
      ]
    }"#;

    #[test]
    fn parses_tool_output() {
        let track = VisemeTrack::from_json(RHUBARB_OUTPUT).unwrap();
        assert_eq!(track.len(), 3);
        assert_eq!(track.cues()[1].value, "C");
        assert_eq!(
            track.metadata().and_then(|m| m.duration),
            Some(0.92)
        );
        assert!((track.duration() - 0.92).abs() < f64::EPSILON);
    }

    #[test]
    fn serializes_back_to_tool_shape() {
        let track = VisemeTrack::from_json(RHUBARB_OUTPUT).unwrap();
        let value = serde_json::to_value(&track).unwrap();
        assert_eq!(value["metadata"]["soundFile"], "audios/message_0.wav");
        assert_eq!(value["mouthCues"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn metadata_is_optional() {
        let track =
            VisemeTrack::from_json(r#"{"mouthCues":[{"start":0,"end":1,"value":"A"}]}"#).unwrap();
        assert!(track.metadata().is_none());
        let value = serde_json::to_value(&track).unwrap();
        assert!(value.get("metadata").is_none());
    }

    #[test]
    fn rejects_empty_track() {
        let err = VisemeTrack::from_json(r#"{"mouthCues":[]}"#).unwrap_err();
        assert!(err.to_string().contains("no mouth cues"), "got: {}", err);
    }

    #[test]
    fn rejects_reversed_cue() {
        let result = VisemeTrack::new(vec![VisemeCue::new(0.5, 0.2, "B")]);
        assert!(matches!(result, Err(TrackError::Reversed { index: 0, .. })));
    }

    #[test]
    fn rejects_out_of_order_cues() {
        let result = VisemeTrack::new(vec![
            VisemeCue::new(0.3, 0.4, "B"),
            VisemeCue::new(0.1, 0.2, "C"),
        ]);
        assert!(matches!(result, Err(TrackError::OutOfOrder { index: 1, .. })));
    }

    #[test]
    fn rejects_non_finite_timestamps() {
        let result = VisemeTrack::new(vec![VisemeCue::new(0.0, f64::INFINITY, "X")]);
        assert!(matches!(result, Err(TrackError::NonFinite { index: 0 })));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            VisemeTrack::from_json("not json"),
            Err(TrackError::Malformed(_))
        ));
    }
}
