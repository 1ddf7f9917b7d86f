use crate::config::SynthesisConfig;
use crate::error::VoiceError;
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;

/// Maximum text input size for a single synthesis request (64 KiB).
const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// How much of a provider error body is kept in the error message.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Produces speech audio for a piece of text.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesizes `text` and writes the compressed audio to `destination`.
    async fn synthesize(&self, text: &str, destination: &Path) -> Result<(), VoiceError>;
}

/// Lists the voices a synthesis provider offers.
#[async_trait]
pub trait VoiceCatalog: Send + Sync {
    async fn list_voices(&self) -> Result<serde_json::Value, VoiceError>;
}

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// Speech synthesis through the ElevenLabs HTTP API.
///
/// One outbound request per call; failures are returned immediately without
/// retry.
#[derive(Debug, Clone)]
pub struct ElevenLabsSynthesizer {
    client: reqwest::Client,
    config: SynthesisConfig,
}

impl ElevenLabsSynthesizer {
    pub fn new(config: SynthesisConfig) -> Self {
        let client = match reqwest::Client::builder().timeout(config.timeout()).build() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("failed to build speech HTTP client, request timeout disabled: {}", e);
                reqwest::Client::new()
            }
        };
        Self { client, config }
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn require_credentials(&self) -> Result<(), VoiceError> {
        if self.config.api_key.trim().is_empty() {
            return Err(VoiceError::Synthesis(
                "API key is not configured".to_string(),
            ));
        }
        Ok(())
    }
}

async fn provider_error(response: reqwest::Response) -> VoiceError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    VoiceError::Synthesis(format!("provider returned {}: {}", status, body.trim()))
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, text: &str, destination: &Path) -> Result<(), VoiceError> {
        if text.trim().is_empty() {
            return Err(VoiceError::Synthesis("text is empty".to_string()));
        }
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(VoiceError::Synthesis(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                text.len(),
                MAX_TTS_INPUT_BYTES
            )));
        }
        self.require_credentials()?;
        if self.config.voice_id.trim().is_empty() {
            return Err(VoiceError::Synthesis("voice id is not configured".to_string()));
        }

        let url = self.endpoint(&format!("/v1/text-to-speech/{}", self.config.voice_id));
        let response = self
            .client
            .post(url)
            .header("xi-api-key", &self.config.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&SynthesisRequest {
                text,
                model_id: &self.config.model_id,
            })
            .send()
            .await
            .map_err(|e| VoiceError::Synthesis(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| VoiceError::Synthesis(format!("failed to read audio: {}", e)))?;
        if audio.is_empty() {
            return Err(VoiceError::Synthesis(
                "provider returned empty audio".to_string(),
            ));
        }

        tokio::fs::write(destination, &audio).await?;
        Ok(())
    }
}

#[async_trait]
impl VoiceCatalog for ElevenLabsSynthesizer {
    async fn list_voices(&self) -> Result<serde_json::Value, VoiceError> {
        self.require_credentials()?;

        let response = self
            .client
            .get(self.endpoint("/v1/voices"))
            .header("xi-api-key", &self.config.api_key)
            .send()
            .await
            .map_err(|e| VoiceError::Synthesis(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| VoiceError::Synthesis(format!("invalid voice list: {}", e)))
    }
}
