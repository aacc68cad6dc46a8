//! OpenAI-compatible client for embeddings and chat completion.
//!
//! Embedding calls retry server errors with exponential backoff; client errors are final.
//! Chat calls surface context length rejections as their own error so callers can shrink
//! the prompt and resubmit.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::provider::{ChatModel, Embedder, Message};

/// Marker the API puts in the body of a 400 when the prompt is too long.
const CONTEXT_LENGTH_EXCEEDED: &str = "context_length_exceeded";

/// HTTP client for one OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    embed_model: String,
    chat_model: String,
    max_tokens: u32,
    retries: u32,
    backoff_base: Duration,
}

impl fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("embed_model", &self.embed_model)
            .field("chat_model", &self.chat_model)
            .field("max_tokens", &self.max_tokens)
            .field("retries", &self.retries)
            .field("backoff_base", &self.backoff_base)
            .finish()
    }
}

impl OpenAiClient {
    /// Create from config and API key. Fails if `config.base_url` isn't a valid URL.
    pub fn new(config: &Config, api_key: impl Into<String>) -> Result<Self, ApiError> {
        let url = url::Url::parse(&config.base_url)?;
        let base_url = url.as_str().trim_end_matches('/').to_string();
        Ok(Self {
            client: default_client(),
            api_key: api_key.into(),
            base_url,
            embed_model: config.embed_model.clone(),
            chat_model: config.chat_model.clone(),
            max_tokens: config.max_output_tokens,
            retries: config.embed_retries,
            backoff_base: config.backoff_base(),
        })
    }

    /// Embed one text, retrying on 5xx up to the configured number of attempts.
    pub async fn embed_text(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let body = EmbeddingRequest {
            model: &self.embed_model,
            input: text,
        };
        let mut attempt = 0;
        loop {
            let response = self
                .client
                .post(format!("{}/embeddings", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await?;
            let status = response.status();
            let raw = response.text().await?;

            if status.is_server_error() {
                attempt += 1;
                if attempt >= self.retries {
                    tracing::error!(%status, "embedding failed after {attempt} attempt(s)");
                    return Err(ApiError::Status { status, body: raw });
                }
                let delay = backoff_delay(self.backoff_base, attempt - 1);
                tracing::warn!(
                    %status,
                    "server error on attempt {attempt}, retrying in {}ms",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                continue;
            }
            if !status.is_success() {
                tracing::error!(%status, "client error on attempt {}, not retrying: {raw}", attempt + 1);
                return Err(ApiError::Status { status, body: raw });
            }
            return parse_embedding(&raw);
        }
    }

    /// Send one chat completion and return the trimmed first choice.
    pub async fn chat(&self, messages: &[Message]) -> Result<String, ApiError> {
        let body = ChatRequest {
            model: &self.chat_model,
            messages,
            max_tokens: self.max_tokens,
        };
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::BAD_REQUEST && text.contains(CONTEXT_LENGTH_EXCEEDED) {
            return Err(ApiError::ContextLengthExceeded(text));
        }
        if !status.is_success() {
            tracing::error!(%status, "error generating response: {text}");
            return Err(ApiError::Status { status, body: text });
        }
        let resp: ChatResponse = serde_json::from_str(&text)?;
        resp.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| ApiError::UnexpectedResponse(text))
    }
}

impl Embedder for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        self.embed_text(text).await
    }
}

impl ChatModel for OpenAiClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, ApiError> {
        self.chat(messages).await
    }
}

/// `base × 2^attempt`, saturating instead of overflowing.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

fn default_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(120))
        .user_agent(concat!("repoask/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("default HTTP client construction must not fail")
}

fn parse_embedding(text: &str) -> Result<Vec<f32>, ApiError> {
    let unexpected = || ApiError::UnexpectedResponse(text.to_string());
    let resp: EmbeddingResponse = serde_json::from_str(text).map_err(|_| unexpected())?;
    let embedding = resp
        .data
        .and_then(|d| d.into_iter().next())
        .map(|d| d.embedding)
        .ok_or_else(unexpected)?;
    if embedding.is_empty() {
        return Err(unexpected());
    }
    Ok(embedding)
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Option<Vec<EmbeddingDatum>>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid base URL: {0}")]
    ParseUrl(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("context length exceeded: {0}")]
    ContextLengthExceeded(String),
    #[error("unexpected response format: {0}")]
    UnexpectedResponse(String),
    #[error("invalid response JSON: {0}")]
    Json(#[from] serde_json::Error),
}
