//! Conversion of synthesized audio into the analyzer's canonical format.

use crate::error::VoiceError;
use crate::invoker::{ToolCommand, ToolInvoker};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Converts an audio file into the canonical decoded format.
///
/// Implementations must overwrite `destination` if it already exists, so that
/// re-running a conversion for the same artifact is safe.
#[async_trait]
pub trait AudioTranscoder: Send + Sync {
    async fn transcode(&self, source: &Path, destination: &Path) -> Result<(), VoiceError>;
}

/// Transcoder backed by the `ffmpeg` executable.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: PathBuf,
    invoker: ToolInvoker,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<PathBuf>, invoker: ToolInvoker) -> Self {
        Self {
            binary: binary.into(),
            invoker,
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Fails with [`VoiceError::ToolUnavailable`] unless `ffmpeg -version` succeeds.
    pub async fn ensure_available(&self) -> Result<(), VoiceError> {
        self.invoker
            .probe(&self.binary, "-version")
            .await
            .map_err(|e| {
                VoiceError::ToolUnavailable(format!(
                    "{} is not installed or not available in PATH ({})",
                    self.binary.display(),
                    e
                ))
            })
    }
}

#[async_trait]
impl AudioTranscoder for FfmpegTranscoder {
    async fn transcode(&self, source: &Path, destination: &Path) -> Result<(), VoiceError> {
        self.ensure_available().await?;

        // Surface a missing input as I/O rather than as an opaque ffmpeg failure.
        tokio::fs::metadata(source).await?;

        let command = ToolCommand::new(&self.binary)
            .arg("-y")
            .arg("-i")
            .arg(source)
            .arg(destination);
        self.invoker.run(&command).await?;

        debug!(
            source = %source.display(),
            destination = %destination.display(),
            "transcoded audio"
        );
        Ok(())
    }
}
