//! Phoneme analysis: audio in, viseme timing out.

use crate::error::VoiceError;
use crate::invoker::{ToolCommand, ToolInvoker};
use async_trait::async_trait;
use mouthpiece_types::VisemeTrack;
use std::path::{Path, PathBuf};

/// Recognizer used when none is configured. Language-independent.
pub const DEFAULT_RECOGNIZER: &str = "phonetic";

/// Produces a viseme track from canonical audio.
///
/// `timing_output` is where the analyzer may write its raw output; callers
/// own that path and clean it up.
#[async_trait]
pub trait PhonemeAnalyzer: Send + Sync {
    async fn analyze(&self, audio: &Path, timing_output: &Path)
        -> Result<VisemeTrack, VoiceError>;
}

/// Analyzer backed by the Rhubarb Lip Sync executable.
#[derive(Debug, Clone)]
pub struct RhubarbAnalyzer {
    binary: PathBuf,
    recognizer: String,
    invoker: ToolInvoker,
}

impl RhubarbAnalyzer {
    pub fn new(binary: impl Into<PathBuf>, invoker: ToolInvoker) -> Self {
        Self {
            binary: binary.into(),
            recognizer: DEFAULT_RECOGNIZER.to_string(),
            invoker,
        }
    }

    pub fn with_recognizer(mut self, recognizer: impl Into<String>) -> Self {
        self.recognizer = recognizer.into();
        self
    }

    fn command(&self, audio: &Path, timing_output: &Path) -> ToolCommand {
        ToolCommand::new(&self.binary)
            .arg("-f")
            .arg("json")
            .arg("-o")
            .arg(timing_output)
            .arg(audio)
            .arg("-r")
            .arg(&self.recognizer)
    }
}

#[async_trait]
impl PhonemeAnalyzer for RhubarbAnalyzer {
    async fn analyze(
        &self,
        audio: &Path,
        timing_output: &Path,
    ) -> Result<VisemeTrack, VoiceError> {
        self.invoker.run(&self.command(audio, timing_output)).await?;

        let json = match tokio::fs::read_to_string(timing_output).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VoiceError::Analysis(format!(
                    "no timing output written to {}",
                    timing_output.display()
                )))
            }
            Err(e) => return Err(VoiceError::Io(e)),
        };

        VisemeTrack::from_json(&json).map_err(|e| {
            VoiceError::Analysis(format!(
                "unusable timing output in {}: {}",
                timing_output.display(),
                e
            ))
        })
    }
}
