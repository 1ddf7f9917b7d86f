use mouthpiece_types::ArtifactId;
use mouthpiece_voice::VoiceError;
use std::fmt;
use thiserror::Error;

/// Pipeline stage that performs work for an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Synthesizing,
    Transcoding,
    Analyzing,
    Loading,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Synthesizing => "Synthesizing",
            Self::Transcoding => "Transcoding",
            Self::Analyzing => "Analyzing",
            Self::Loading => "Loading",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stage failed for one utterance.
///
/// The underlying [`VoiceError`] is carried unmodified so callers can still
/// tell a missing tool from a rejected request.
#[derive(Debug, Error)]
#[error("utterance {index} failed while {stage}: {source}")]
pub struct StageFailure {
    /// Position of the utterance in its batch.
    pub index: usize,
    pub stage: Stage,
    pub artifact_id: ArtifactId,
    #[source]
    pub source: VoiceError,
}
