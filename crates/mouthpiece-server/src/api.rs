//! API handlers for the Mouthpiece server.

use crate::llm::LlmError;
use crate::AppState;
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mouthpiece_pipeline::{Stage, StageFailure};
use mouthpiece_types::ResponseUtterance;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Request body for `POST /chat`.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

/// Response body for `POST /chat`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub messages: Vec<ResponseUtterance>,
}

/// API error type mapping to HTTP responses.
///
/// Every variant is a server error; the body carries a short message only,
/// the full cause is logged.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("language model reply unusable: {0}")]
    UpstreamFormat(String),
    #[error("language model unavailable: {0}")]
    Upstream(String),
    #[error(transparent)]
    Pipeline(#[from] StageFailure),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::UpstreamFormat(msg) => ApiError::UpstreamFormat(msg),
            LlmError::Request(msg) => ApiError::Upstream(msg),
        }
    }
}

fn stage_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Synthesizing => "Failed to generate audio",
        Stage::Transcoding | Stage::Analyzing => "Failed to generate lipsync",
        Stage::Loading => "Failed to read audio or lipsync file",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("request failed: {}", self);

        let body = match &self {
            ApiError::UpstreamFormat(_) => serde_json::json!({
                "error": "Failed to understand the language model reply"
            }),
            ApiError::Upstream(_) => serde_json::json!({
                "error": "Failed to get a reply from the language model"
            }),
            ApiError::Pipeline(failure) => serde_json::json!({
                "error": stage_message(failure.stage),
                "stage": failure.stage.as_str(),
                "index": failure.index,
            }),
            ApiError::InternalServerError(msg) => serde_json::json!({ "error": msg }),
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Handler for `POST /chat`.
///
/// An empty message gets a pre-rendered greeting; missing credentials get the
/// pre-rendered reminder. Otherwise the language model's utterances are run
/// through the media pipeline, and the response holds either every utterance
/// or a single error.
pub async fn chat_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = payload
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());

    let Some(message) = message else {
        let intro = state.canned.random_intro().await.map_err(|e| {
            ApiError::InternalServerError(format!("Failed to load greeting: {}", e))
        })?;
        return Ok(Json(ChatResponse {
            messages: vec![intro],
        }));
    };

    if !state.credentials_configured {
        tracing::warn!("API keys are not configured, replying with reminder clips");
        let messages = state.canned.missing_keys().await.map_err(|e| {
            ApiError::InternalServerError(format!("Failed to load reminder: {}", e))
        })?;
        return Ok(Json(ChatResponse { messages }));
    }

    let utterances = state.chat_model.reply(message).await?;
    tracing::info!(count = utterances.len(), "received utterances from language model");

    let messages = state.sequencer.process_all(&utterances).await?;
    Ok(Json(ChatResponse { messages }))
}

/// Handler for `GET /voices`.
pub async fn voices_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.voices.list_voices().await.map(Json).map_err(|e| {
        tracing::warn!("voice catalog request failed: {}", e);
        ApiError::InternalServerError("Failed to list voices".to_string())
    })
}
