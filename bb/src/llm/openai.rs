//! OpenAI-compatible API client implementation
//!
//! Implements the LlmClient trait against the chat completions and
//! embeddings endpoints, with bounded retry/backoff on transient errors
//! and a deterministic offline fallback for embeddings.

use async_trait::async_trait;
use blockerstore::{Embedder, EmbedderError};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{CompletionRequest, CompletionResponse, FALLBACK_EMBED_DIM, LlmClient, LlmError, TokenUsage, fallback_embedding};
use crate::config::LlmConfig;

/// Maximum number of retries for transient errors (4 attempts total)
const MAX_RETRIES: u32 = 3;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 800;

/// Multiplier applied to the backoff on each retry
const BACKOFF_MULTIPLIER: f64 = 1.6;

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504 | 529)
}

/// Backoff delay before the given retry attempt (1-based)
fn backoff_delay(attempt: u32) -> Duration {
    let ms = INITIAL_BACKOFF_MS as f64 * BACKOFF_MULTIPLIER.powi(attempt.saturating_sub(1) as i32);
    Duration::from_millis(ms as u64)
}

/// OpenAI-compatible API client
pub struct OpenAiClient {
    model: String,
    embedding_model: String,
    api_key: Option<String>,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

impl OpenAiClient {
    /// Create a new client from configuration
    ///
    /// A missing API key is tolerated (calls will fail and stages will
    /// fall back; embeddings degrade to the offline vector) so demo mode
    /// works without credentials.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, "from_config: called");
        let api_key = config.get_api_key().ok();
        if api_key.is_none() {
            warn!(env = %config.api_key_env, "API key not set; model calls will degrade to fallbacks");
        }

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            embedding_model: config.embedding_model.clone(),
            api_key,
            base_url: config.base_url.clone(),
            http,
            max_tokens: config.max_tokens,
        })
    }

    /// Build the chat completions request body
    fn build_chat_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, request.temperature, "build_chat_body: called");
        let mut messages = vec![serde_json::json!({
            "role": "system",
            "content": request.system_prompt,
        })];
        for msg in &request.messages {
            messages.push(serde_json::json!({
                "role": msg.role,
                "content": msg.content,
            }));
        }

        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens.min(self.max_tokens),
        })
    }

    /// POST a JSON body with bounded retry/backoff
    async fn post_with_retries(&self, url: &str, body: &serde_json::Value) -> Result<reqwest::Response, LlmError> {
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let backoff = backoff_delay(attempt);
                warn!(attempt, backoff_ms = backoff.as_millis() as u64, "post_with_retries: retrying after transient error");
                tokio::time::sleep(backoff).await;
            }

            let mut builder = self.http.post(url).header("content-type", "application/json");
            if let Some(key) = &self.api_key {
                builder = builder.bearer_auth(key);
            }

            let response = match builder.json(body).send().await {
                Ok(r) => r,
                Err(e) => {
                    debug!(attempt, error = %e, "post_with_retries: network error");
                    last_error = Some(LlmError::Network(e));
                    continue;
                }
            };

            let status = response.status().as_u16();

            if status == 429 {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(1);
                debug!(attempt, retry_after, "post_with_retries: rate limited (429)");

                if attempt < MAX_RETRIES {
                    tokio::time::sleep(Duration::from_secs(retry_after)).await;
                    last_error = Some(LlmError::RateLimited {
                        retry_after: Duration::from_secs(retry_after),
                    });
                    continue;
                }
                return Err(LlmError::RateLimited {
                    retry_after: Duration::from_secs(retry_after),
                });
            }

            if is_retryable_status(status) && attempt < MAX_RETRIES {
                let text = response.text().await.unwrap_or_default();
                debug!(attempt, status, "post_with_retries: retryable error");
                last_error = Some(LlmError::ApiError { status, message: text });
                continue;
            }

            if !response.status().is_success() {
                debug!(status, "post_with_retries: API error");
                let text = response.text().await.unwrap_or_default();
                return Err(LlmError::ApiError { status, message: text });
            }

            return Ok(response);
        }

        Err(last_error.unwrap_or_else(|| LlmError::InvalidResponse("Max retries exceeded".to_string())))
    }

    /// Parse the chat completions response
    fn parse_chat_response(&self, api_response: ChatResponse) -> Result<CompletionResponse, LlmError> {
        debug!(choice_count = api_response.choices.len(), "parse_chat_response: called");
        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("Response contained no message content".to_string()))?;

        let usage = api_response
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse { content, usage })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, request.max_tokens, "complete: called");
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.build_chat_body(&request);

        let response = self.post_with_retries(&url, &body).await?;
        let api_response: ChatResponse = response.json().await?;
        self.parse_chat_response(api_response)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        debug!(text_len = text.len(), "embed: called");
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = serde_json::json!({
            "model": self.embedding_model,
            "input": text,
        });

        // Any terminal failure degrades to the deterministic offline
        // vector so similarity search keeps working without a provider.
        let response = match self.post_with_retries(&url, &body).await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "embed: provider unavailable, using fallback embedding");
                return Ok(fallback_embedding(text, FALLBACK_EMBED_DIM));
            }
        };

        let api_response: Result<EmbeddingResponse, _> = response.json().await;
        match api_response {
            Ok(parsed) => match parsed.data.into_iter().next() {
                Some(data) => Ok(data.embedding),
                None => {
                    warn!("embed: empty embedding payload, using fallback embedding");
                    Ok(fallback_embedding(text, FALLBACK_EMBED_DIM))
                }
            },
            Err(e) => {
                warn!(error = %e, "embed: malformed embedding payload, using fallback embedding");
                Ok(fallback_embedding(text, FALLBACK_EMBED_DIM))
            }
        }
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        LlmClient::embed(self, text).await.map_err(|e| EmbedderError(e.to_string()))
    }
}

// OpenAI API response types

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Message;

    fn test_client() -> OpenAiClient {
        OpenAiClient {
            model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            api_key: Some("test-key".to_string()),
            base_url: "https://api.openai.com".to_string(),
            http: Client::new(),
            max_tokens: 2048,
        }
    }

    #[test]
    fn test_build_chat_body_basic() {
        let client = test_client();
        let request = CompletionRequest {
            system_prompt: "You are helpful".to_string(),
            messages: vec![Message::user("Hello")],
            temperature: 0.3,
            max_tokens: 1000,
        };

        let body = client.build_chat_body(&request);

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "You are helpful");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Hello");
    }

    #[test]
    fn test_max_tokens_capped() {
        let client = test_client();
        let request = CompletionRequest {
            system_prompt: "Test".to_string(),
            messages: vec![],
            temperature: 0.0,
            max_tokens: 50_000,
        };

        let body = client.build_chat_body(&request);
        assert_eq!(body["max_tokens"], 2048);
    }

    #[test]
    fn test_parse_chat_response() {
        let client = test_client();
        let api_response: ChatResponse = serde_json::from_str(
            r#"{
                "choices": [{"message": {"role": "assistant", "content": "hi"}}],
                "usage": {"prompt_tokens": 10, "completion_tokens": 2}
            }"#,
        )
        .unwrap();

        let response = client.parse_chat_response(api_response).unwrap();
        assert_eq!(response.content, "hi");
        assert_eq!(response.usage.input_tokens, 10);
        assert_eq!(response.usage.output_tokens, 2);
    }

    #[test]
    fn test_parse_chat_response_no_content() {
        let client = test_client();
        let api_response: ChatResponse =
            serde_json::from_str(r#"{"choices": [], "usage": null}"#).unwrap();

        assert!(client.parse_chat_response(api_response).is_err());
    }

    #[test]
    fn test_backoff_delay_grows() {
        assert_eq!(backoff_delay(1), Duration::from_millis(800));
        assert!(backoff_delay(2) > backoff_delay(1));
        assert!(backoff_delay(3) > backoff_delay(2));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(401));
    }
}
