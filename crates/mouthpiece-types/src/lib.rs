//! Shared types for the Mouthpiece workspace.
//!
//! This crate holds the data model that flows through the media pipeline:
//! the utterances produced by the language model, the identifiers that
//! namespace per-utterance artifacts, the viseme tracks produced by phoneme
//! analysis, and the assembled response utterances returned to clients.
//!
//! Wire names follow the client contract (`facialExpression`, `mouthCues`,
//! `Talking_0`, ...), so every type here serializes to exactly what the
//! browser-side avatar expects.

pub mod lipsync;

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub use lipsync::{TrackError, TrackMetadata, VisemeCue, VisemeTrack};

/// Facial expression the avatar wears while speaking an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FacialExpression {
    Smile,
    Sad,
    Angry,
    Surprised,
    FunnyFace,
    #[default]
    Default,
}

impl FacialExpression {
    /// All expressions, in the order they are advertised to the language model.
    pub const ALL: [FacialExpression; 6] = [
        Self::Smile,
        Self::Sad,
        Self::Angry,
        Self::Surprised,
        Self::FunnyFace,
        Self::Default,
    ];

    /// Returns the wire name of this expression.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Smile => "smile",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Surprised => "surprised",
            Self::FunnyFace => "funnyFace",
            Self::Default => "default",
        }
    }
}

/// Animation clip played while an utterance is spoken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Animation {
    #[serde(rename = "Talking_0")]
    Talking0,
    #[serde(rename = "Talking_1")]
    Talking1,
    #[serde(rename = "Talking_2")]
    Talking2,
    Crying,
    Laughing,
    Rumba,
    #[default]
    Idle,
    Terrified,
    Angry,
}

impl Animation {
    /// All animation clips, in the order they are advertised to the language model.
    pub const ALL: [Animation; 9] = [
        Self::Talking0,
        Self::Talking1,
        Self::Talking2,
        Self::Crying,
        Self::Laughing,
        Self::Rumba,
        Self::Idle,
        Self::Terrified,
        Self::Angry,
    ];

    /// Returns the wire name of this animation clip.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Talking0 => "Talking_0",
            Self::Talking1 => "Talking_1",
            Self::Talking2 => "Talking_2",
            Self::Crying => "Crying",
            Self::Laughing => "Laughing",
            Self::Rumba => "Rumba",
            Self::Idle => "Idle",
            Self::Terrified => "Terrified",
            Self::Angry => "Angry",
        }
    }
}

/// One unit of agent speech as produced by the language model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    /// The text to speak.
    pub text: String,
    #[serde(rename = "facialExpression")]
    pub facial_expression: FacialExpression,
    pub animation: Animation,
}

impl Utterance {
    pub fn new(
        text: impl Into<String>,
        facial_expression: FacialExpression,
        animation: Animation,
    ) -> Self {
        Self {
            text: text.into(),
            facial_expression,
            animation,
        }
    }
}

/// Identifier minted once per utterance pipeline run.
///
/// Every intermediate and final artifact of the run is named after it, so two
/// runs (in the same batch, in concurrent requests, or retried) never touch
/// each other's files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(Uuid);

impl ArtifactId {
    /// Mints a fresh random identifier.
    pub fn mint() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_hyphenated())
    }
}

/// A fully assembled utterance returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseUtterance {
    pub text: String,
    /// Synthesized speech, base64-encoded.
    pub audio: String,
    /// Viseme timing for the mouth animation.
    pub lipsync: VisemeTrack,
    #[serde(rename = "facialExpression")]
    pub facial_expression: FacialExpression,
    pub animation: Animation,
}

impl ResponseUtterance {
    /// Assembles a response from the source utterance and its media.
    pub fn assemble(utterance: &Utterance, audio: String, lipsync: VisemeTrack) -> Self {
        Self {
            text: utterance.text.clone(),
            audio,
            lipsync,
            facial_expression: utterance.facial_expression,
            animation: utterance.animation,
        }
    }
}
