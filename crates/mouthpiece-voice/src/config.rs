use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_ELEVENLABS_URL: &str = "https://api.elevenlabs.io";
pub const DEFAULT_ELEVENLABS_MODEL: &str = "eleven_multilingual_v2";

fn default_base_url() -> String {
    DEFAULT_ELEVENLABS_URL.to_string()
}

fn default_model_id() -> String {
    DEFAULT_ELEVENLABS_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Credentials and endpoint settings for the speech-synthesis service.
#[derive(Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default)]
    pub voice_id: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Request timeout in seconds. Default: 60.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            voice_id: String::new(),
            base_url: default_base_url(),
            model_id: default_model_id(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for SynthesisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthesisConfig")
            .field("api_key", &"[REDACTED]")
            .field("voice_id", &self.voice_id)
            .field("base_url", &self.base_url)
            .field("model_id", &self.model_id)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl SynthesisConfig {
    pub fn new(api_key: impl Into<String>, voice_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            voice_id: voice_id.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// True when both the API key and the voice are set.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.voice_id.trim().is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
