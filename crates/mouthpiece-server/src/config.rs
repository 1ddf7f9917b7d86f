//! Server configuration loading from file and environment variables.

use mouthpiece_voice::SynthesisConfig;
use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub cors: CorsConfig,

    /// Language model settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Speech synthesis settings.
    #[serde(default)]
    pub elevenlabs: SynthesisConfig,

    /// External tools and artifact storage.
    #[serde(default)]
    pub media: MediaConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "mouthpiece_pipeline=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Browser origins allowed to call the API. Empty allows any origin.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

/// OpenAI-compatible chat completion settings.
#[derive(Clone, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_openai_url")]
    pub base_url: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
    /// Persona instructions. The reply-format instructions are always appended.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

/// External tools and artifact storage.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Where per-utterance artifacts are written.
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
    /// Where pre-rendered clips live.
    #[serde(default = "default_artifacts_dir")]
    pub canned_dir: PathBuf,
    #[serde(default = "default_ffmpeg_binary")]
    pub ffmpeg_binary: PathBuf,
    #[serde(default = "default_rhubarb_binary")]
    pub rhubarb_binary: PathBuf,
    /// Rhubarb recognizer (`phonetic` or `pocketSphinx`).
    #[serde(default = "default_recognizer")]
    pub recognizer: String,
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
    /// Keep artifact files after each request (for debugging).
    #[serde(default)]
    pub keep_artifacts: bool,
    /// Utterances processed at once per request. 1 means strictly sequential.
    #[serde(default = "default_max_concurrent_utterances")]
    pub max_concurrent_utterances: usize,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:5174".to_string(),
    ]
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo-1106".to_string()
}

fn default_openai_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.6
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("audios")
}

fn default_ffmpeg_binary() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_rhubarb_binary() -> PathBuf {
    PathBuf::from("bin/rhubarb/rhubarb")
}

fn default_recognizer() -> String {
    mouthpiece_voice::lipsync::DEFAULT_RECOGNIZER.to_string()
}

fn default_tool_timeout_secs() -> u64 {
    60
}

fn default_max_concurrent_utterances() -> usize {
    1
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_openai_model(),
            base_url: default_openai_url(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_request_timeout_secs(),
            system_prompt: None,
        }
    }
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .finish()
    }
}

impl OpenAiConfig {
    /// True when a usable key is set. `-` is treated as a placeholder.
    pub fn is_configured(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && key != "-"
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: default_artifacts_dir(),
            canned_dir: default_artifacts_dir(),
            ffmpeg_binary: default_ffmpeg_binary(),
            rhubarb_binary: default_rhubarb_binary(),
            recognizer: default_recognizer(),
            tool_timeout_secs: default_tool_timeout_secs(),
            keep_artifacts: false,
            max_concurrent_utterances: default_max_concurrent_utterances(),
        }
    }
}

impl Config {
    /// True when both the language model and speech synthesis can be called.
    pub fn credentials_configured(&self) -> bool {
        self.openai.is_configured() && self.elevenlabs.is_configured()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `MOUTHPIECE_HOST`, `MOUTHPIECE_PORT`
/// - `MOUTHPIECE_LOG_LEVEL`, `MOUTHPIECE_LOG_JSON` ("true" or "1")
/// - `OPENAI_API_KEY`
/// - `ELEVEN_LABS_API_KEY`, `ELEVEN_LABS_VOICE_ID`
/// - `MOUTHPIECE_ARTIFACTS_DIR`, `MOUTHPIECE_FFMPEG_BINARY`, `MOUTHPIECE_RHUBARB_BINARY`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(host) = var("MOUTHPIECE_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = var("MOUTHPIECE_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(level) = var("MOUTHPIECE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("MOUTHPIECE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(key) = var("OPENAI_API_KEY") {
        config.openai.api_key = key;
    }
    if let Some(key) = var("ELEVEN_LABS_API_KEY") {
        config.elevenlabs.api_key = key;
    }
    if let Some(voice) = var("ELEVEN_LABS_VOICE_ID") {
        config.elevenlabs.voice_id = voice;
    }
    if let Some(dir) = var("MOUTHPIECE_ARTIFACTS_DIR") {
        config.media.artifacts_dir = PathBuf::from(dir);
    }
    if let Some(binary) = var("MOUTHPIECE_FFMPEG_BINARY") {
        config.media.ffmpeg_binary = PathBuf::from(binary);
    }
    if let Some(binary) = var("MOUTHPIECE_RHUBARB_BINARY") {
        config.media.rhubarb_binary = PathBuf::from(binary);
    }
}
