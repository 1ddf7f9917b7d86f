//! Pre-rendered utterances served without running the pipeline.
//!
//! Each clip is a `<stem>.wav` audio file with a matching `<stem>.json`
//! viseme track in the canned directory, rendered ahead of time with the
//! same tools the pipeline uses.

use crate::artifact::{read_audio_base64, read_track};
use mouthpiece_types::{Animation, FacialExpression, ResponseUtterance, Utterance};
use mouthpiece_voice::VoiceError;
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};

/// A pre-rendered utterance.
#[derive(Debug, Clone, Copy)]
pub struct CannedClip {
    pub stem: &'static str,
    pub text: &'static str,
    pub facial_expression: FacialExpression,
    pub animation: Animation,
}

/// Greetings; one is picked at random when the user sends no message.
///
/// Stems match the file names of the bundled `audios/` assets.
pub const INTRO_CLIPS: &[CannedClip] = &[
    CannedClip {
        stem: "ambi_intro",
        text: "Hey there! I'm all ears. Ask me anything you like.",
        facial_expression: FacialExpression::Smile,
        animation: Animation::Talking0,
    },
    CannedClip {
        stem: "ambi_intro_01",
        text: "Good to see you. What do you want to talk about today?",
        facial_expression: FacialExpression::Smile,
        animation: Animation::Talking1,
    },
    CannedClip {
        stem: "ambi_intro_02",
        text: "Go ahead, type something and I'll answer out loud.",
        facial_expression: FacialExpression::Smile,
        animation: Animation::Talking0,
    },
];

/// Played when the language model or speech credentials are not configured.
pub const MISSING_KEYS_CLIPS: &[CannedClip] = &[
    CannedClip {
        stem: "api_0",
        text: "Please my dear, don't forget to add your API keys!",
        facial_expression: FacialExpression::Angry,
        animation: Animation::Idle,
    },
    CannedClip {
        stem: "api_1",
        text: "You don't want to end up with a crazy language model and speech bill, right?",
        facial_expression: FacialExpression::Smile,
        animation: Animation::Laughing,
    },
];

/// Loads canned clips from a directory.
#[derive(Debug, Clone)]
pub struct CannedLibrary {
    dir: PathBuf,
}

impl CannedLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn load(&self, clip: &CannedClip) -> Result<ResponseUtterance, VoiceError> {
        let audio = read_audio_base64(&self.dir.join(format!("{}.wav", clip.stem))).await?;
        let lipsync = read_track(&self.dir.join(format!("{}.json", clip.stem))).await?;
        let utterance = Utterance::new(clip.text, clip.facial_expression, clip.animation);
        Ok(ResponseUtterance::assemble(&utterance, audio, lipsync))
    }

    /// One randomly chosen greeting.
    pub async fn random_intro(&self) -> Result<ResponseUtterance, VoiceError> {
        let clip = *INTRO_CLIPS
            .choose(&mut rand::thread_rng())
            .unwrap_or(&INTRO_CLIPS[0]);
        self.load(&clip).await
    }

    /// The "add your API keys" clips, in order.
    pub async fn missing_keys(&self) -> Result<Vec<ResponseUtterance>, VoiceError> {
        let mut responses = Vec::with_capacity(MISSING_KEYS_CLIPS.len());
        for clip in MISSING_KEYS_CLIPS {
            responses.push(self.load(clip).await?);
        }
        Ok(responses)
    }
}
