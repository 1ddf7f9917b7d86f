//! Mouthpiece server library logic.

pub mod api;
pub mod config;
pub mod llm;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Extension, Json, Router,
};
use config::Config;
use llm::{ChatModel, OpenAiChat};
use mouthpiece_pipeline::{ArtifactStore, BatchSequencer, CannedLibrary, UtterancePipeline};
use mouthpiece_voice::{
    ElevenLabsSynthesizer, FfmpegTranscoder, RhubarbAnalyzer, ToolInvoker, VoiceCatalog,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Maximum request body size (64 KiB). Chat messages are short.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Source of the utterance batch for a user message.
    pub chat_model: Arc<dyn ChatModel>,
    /// Media pipeline over a batch of utterances.
    pub sequencer: Arc<BatchSequencer>,
    /// Voice catalog of the speech provider.
    pub voices: Arc<dyn VoiceCatalog>,
    /// Pre-rendered greeting and reminder clips.
    pub canned: CannedLibrary,
    /// Whether language model and speech credentials are present.
    pub credentials_configured: bool,
    /// Browser origins allowed by CORS; empty allows any.
    pub cors_origins: Vec<String>,
}

impl AppState {
    /// Wires the production adapters from configuration.
    pub fn from_config(config: &Config) -> Self {
        let invoker = ToolInvoker::new(Duration::from_secs(config.media.tool_timeout_secs));
        let synthesizer = Arc::new(ElevenLabsSynthesizer::new(config.elevenlabs.clone()));
        let transcoder = Arc::new(FfmpegTranscoder::new(
            &config.media.ffmpeg_binary,
            invoker.clone(),
        ));
        let analyzer = Arc::new(
            RhubarbAnalyzer::new(&config.media.rhubarb_binary, invoker)
                .with_recognizer(&config.media.recognizer),
        );
        let store = ArtifactStore::new(&config.media.artifacts_dir)
            .keep_artifacts(config.media.keep_artifacts);

        let pipeline = Arc::new(UtterancePipeline::new(
            synthesizer.clone(),
            transcoder,
            analyzer,
            store,
        ));
        let sequencer = BatchSequencer::new(pipeline)
            .with_max_in_flight(config.media.max_concurrent_utterances);

        Self {
            chat_model: Arc::new(OpenAiChat::new(config.openai.clone())),
            sequencer: Arc::new(sequencer),
            voices: synthesizer,
            canned: CannedLibrary::new(&config.media.canned_dir),
            credentials_configured: config.credentials_configured(),
            cors_origins: config.cors.allowed_origins.clone(),
        }
    }
}

async fn root() -> &'static str {
    "Hello World!"
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.cors_origins);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/voices", get(api::voices_handler))
        .route("/chat", post(api::chat_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(Extension(Arc::new(state)))
}
