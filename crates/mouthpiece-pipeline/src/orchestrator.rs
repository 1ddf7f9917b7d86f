//! Drives one utterance through the media pipeline.
//!
//! The run is an explicit state machine:
//!
//! ```text
//! Pending -> Synthesizing -> Transcoding -> Analyzing -> Loading -> Complete
//! ```
//!
//! Each state holds exactly what the previous transition produced, so a stage
//! can only start once its input artifact exists. Any transition may fail; the
//! run then stops with a [`StageFailure`] and nothing is assembled.

use crate::artifact::{read_audio_base64, ArtifactSet, ArtifactStore};
use crate::error::{Stage, StageFailure};
use mouthpiece_types::{ArtifactId, ResponseUtterance, Utterance, VisemeTrack};
use mouthpiece_voice::{AudioTranscoder, PhonemeAnalyzer, SpeechSynthesizer, VoiceError};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{field, info, info_span, warn, Instrument, Span};

enum PipelineState {
    Pending,
    Synthesizing(ArtifactSet),
    Transcoding(ArtifactSet),
    Analyzing(ArtifactSet),
    Loading(ArtifactSet, VisemeTrack),
    Complete(ResponseUtterance),
}

/// Runs synthesis, transcoding, phoneme analysis and loading for utterances.
pub struct UtterancePipeline {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    transcoder: Arc<dyn AudioTranscoder>,
    analyzer: Arc<dyn PhonemeAnalyzer>,
    store: ArtifactStore,
}

impl UtterancePipeline {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        transcoder: Arc<dyn AudioTranscoder>,
        analyzer: Arc<dyn PhonemeAnalyzer>,
        store: ArtifactStore,
    ) -> Self {
        Self {
            synthesizer,
            transcoder,
            analyzer,
            store,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Produces the response for the utterance at position `index` of its batch.
    pub async fn run(
        &self,
        index: usize,
        utterance: &Utterance,
    ) -> Result<ResponseUtterance, StageFailure> {
        let span = info_span!("utterance", index, artifact_id = field::Empty);
        self.drive(index, utterance).instrument(span).await
    }

    async fn drive(
        &self,
        index: usize,
        utterance: &Utterance,
    ) -> Result<ResponseUtterance, StageFailure> {
        let mut state = PipelineState::Pending;
        loop {
            state = match state {
                PipelineState::Pending => {
                    let artifacts = self.store.allocate(ArtifactId::mint());
                    Span::current().record("artifact_id", field::display(artifacts.id()));
                    PipelineState::Synthesizing(artifacts)
                }
                PipelineState::Synthesizing(artifacts) => {
                    let work = self
                        .synthesizer
                        .synthesize(&utterance.text, artifacts.compressed());
                    step(index, Stage::Synthesizing, artifacts.id(), work).await?;
                    PipelineState::Transcoding(artifacts)
                }
                PipelineState::Transcoding(artifacts) => {
                    let work = self
                        .transcoder
                        .transcode(artifacts.compressed(), artifacts.canonical());
                    step(index, Stage::Transcoding, artifacts.id(), work).await?;
                    PipelineState::Analyzing(artifacts)
                }
                PipelineState::Analyzing(artifacts) => {
                    let work = self
                        .analyzer
                        .analyze(artifacts.canonical(), artifacts.timing());
                    let track = step(index, Stage::Analyzing, artifacts.id(), work).await?;
                    PipelineState::Loading(artifacts, track)
                }
                PipelineState::Loading(artifacts, track) => {
                    let work = read_audio_base64(artifacts.compressed());
                    let audio = step(index, Stage::Loading, artifacts.id(), work).await?;
                    PipelineState::Complete(ResponseUtterance::assemble(utterance, audio, track))
                }
                PipelineState::Complete(response) => return Ok(response),
            };
        }
    }
}

async fn step<T>(
    index: usize,
    stage: Stage,
    artifact_id: ArtifactId,
    work: impl Future<Output = Result<T, VoiceError>>,
) -> Result<T, StageFailure> {
    let started = Instant::now();
    info!(stage = stage.as_str(), "stage started");

    match work.await {
        Ok(value) => {
            info!(
                stage = stage.as_str(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "stage done"
            );
            Ok(value)
        }
        Err(source) => {
            warn!(
                stage = stage.as_str(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %source,
                "stage failed"
            );
            Err(StageFailure {
                index,
                stage,
                artifact_id,
                source,
            })
        }
    }
}
