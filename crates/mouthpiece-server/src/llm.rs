//! Language-model collaborator: turns the user's text into utterances.

use crate::config::OpenAiConfig;
use async_trait::async_trait;
use mouthpiece_types::{Animation, FacialExpression, Utterance};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PERSONA: &str = "You are a friendly virtual companion with a lively personality. \
Keep answers short and conversational, and stay in character.";

const MAX_REPLY_MESSAGES: usize = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    /// The service could not be reached or rejected the request.
    #[error("language model request failed: {0}")]
    Request(String),

    /// The reply was not an array of utterances nor an object with a `messages` array.
    #[error("language model reply has an unexpected shape: {0}")]
    UpstreamFormat(String),
}

/// Produces the utterance batch for a user message.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn reply(&self, user_message: &str) -> Result<Vec<Utterance>, LlmError>;
}

/// Builds the system prompt: persona text plus the reply-format contract.
pub fn system_prompt(persona: Option<&str>) -> String {
    let expressions: Vec<_> = FacialExpression::ALL.iter().map(|e| e.as_str()).collect();
    let animations: Vec<_> = Animation::ALL.iter().map(|a| a.as_str()).collect();
    format!(
        "{}\n\nYou will always reply with a JSON array of messages, with a maximum of {} messages. \
         Each message has a text, facialExpression, and animation property. \
         The different facial expressions are: {}. \
         The different animations are: {}.",
        persona.unwrap_or(DEFAULT_PERSONA).trim(),
        MAX_REPLY_MESSAGES,
        expressions.join(", "),
        animations.join(", "),
    )
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReplyShape {
    List(Vec<Utterance>),
    Wrapped { messages: Vec<Utterance> },
}

/// Parses a reply that is either `[...]` or `{"messages": [...]}`.
pub fn parse_utterances(content: &str) -> Result<Vec<Utterance>, LlmError> {
    let value: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| LlmError::UpstreamFormat(format!("reply is not JSON: {}", e)))?;

    match serde_json::from_value(value) {
        Ok(ReplyShape::List(utterances)) | Ok(ReplyShape::Wrapped { messages: utterances }) => {
            Ok(utterances)
        }
        Err(_) => Err(LlmError::UpstreamFormat(
            "expected an array of {text, facialExpression, animation} objects \
             or an object with a `messages` array"
                .to_string(),
        )),
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completions against an OpenAI-compatible endpoint in JSON mode.
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    client: reqwest::Client,
    config: OpenAiConfig,
    system_prompt: String,
}

impl OpenAiChat {
    pub fn new(config: OpenAiConfig) -> Self {
        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(
                    "failed to build language model HTTP client, request timeout disabled: {}",
                    e
                );
                reqwest::Client::new()
            }
        };
        let system_prompt = system_prompt(config.system_prompt.as_deref());
        Self {
            client,
            config,
            system_prompt,
        }
    }

    async fn complete(&self, user_message: &str) -> Result<String, LlmError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let request = CompletionRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_message,
                },
            ],
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(512).collect();
            return Err(LlmError::Request(format!("{}: {}", status, body.trim())));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::UpstreamFormat(format!("invalid completion body: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::UpstreamFormat("completion has no message content".to_string()))
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn reply(&self, user_message: &str) -> Result<Vec<Utterance>, LlmError> {
        let content = self.complete(user_message).await?;
        tracing::debug!(content_len = content.len(), "language model replied");
        parse_utterances(&content)
    }
}
