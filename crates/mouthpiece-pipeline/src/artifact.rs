//! Per-utterance artifact files.

use base64::Engine;
use mouthpiece_types::{ArtifactId, VisemeTrack};
use mouthpiece_voice::VoiceError;
use std::path::{Path, PathBuf};

/// Directory that holds the artifacts of every pipeline run.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    keep: bool,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            keep: false,
        }
    }

    /// Keeps artifact files after a run instead of deleting them.
    pub fn keep_artifacts(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the artifacts directory if it does not exist.
    pub async fn prepare(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Reserves the file names for one run.
    pub fn allocate(&self, id: ArtifactId) -> ArtifactSet {
        let stem = format!("message_{}", id);
        ArtifactSet {
            id,
            compressed: self.dir.join(format!("{}.mp3", stem)),
            canonical: self.dir.join(format!("{}.wav", stem)),
            timing: self.dir.join(format!("{}.json", stem)),
            keep: self.keep,
        }
    }
}

/// The files belonging to one pipeline run.
///
/// Dropping the set removes whatever files exist, so a run that completes,
/// fails or is cancelled leaves nothing behind (unless the store keeps
/// artifacts).
#[derive(Debug)]
pub struct ArtifactSet {
    id: ArtifactId,
    compressed: PathBuf,
    canonical: PathBuf,
    timing: PathBuf,
    keep: bool,
}

impl ArtifactSet {
    pub fn id(&self) -> ArtifactId {
        self.id
    }

    /// Synthesized speech as delivered by the provider (mp3).
    pub fn compressed(&self) -> &Path {
        &self.compressed
    }

    /// Decoded audio for the phoneme analyzer (wav).
    pub fn canonical(&self) -> &Path {
        &self.canonical
    }

    /// Raw viseme timing written by the analyzer (json).
    pub fn timing(&self) -> &Path {
        &self.timing
    }
}

impl Drop for ArtifactSet {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        // Blocking removal: Drop cannot await, and this must also run when a
        // cancelled run is dropped.
        for path in [&self.compressed, &self.canonical, &self.timing] {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), "failed to remove artifact: {}", e)
                }
            }
        }
    }
}

/// Reads an audio file and returns it base64-encoded.
pub async fn read_audio_base64(path: &Path) -> Result<String, VoiceError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}

/// Reads a viseme track previously written by the analyzer.
pub async fn read_track(path: &Path) -> Result<VisemeTrack, VoiceError> {
    let json = tokio::fs::read_to_string(path).await?;
    VisemeTrack::from_json(&json)
        .map_err(|e| VoiceError::Analysis(format!("{}: {}", path.display(), e)))
}
