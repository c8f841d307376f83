//! LLM request/response types for BlockerBot
//!
//! These types model an OpenAI-compatible chat completions API but are
//! provider-agnostic enough to support other providers in the future.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A completion request - everything needed for one LLM call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System prompt for this stage
    pub system_prompt: String,

    /// User messages (typically just one per stage call)
    pub messages: Vec<Message>,

    /// Sampling temperature
    pub temperature: f32,

    /// Max tokens for response (from config)
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Build a one-shot request: system prompt plus a single user message
    pub fn one_shot(system_prompt: impl Into<String>, user_content: impl Into<String>) -> Self {
        debug!("CompletionRequest::one_shot: called");
        Self {
            system_prompt: system_prompt.into(),
            messages: vec![Message::user(user_content)],
            temperature: 0.2,
            max_tokens: 1024,
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        debug!("Message::user: called");
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        debug!("Message::assistant: called");
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Text content returned by the model
    pub content: String,

    /// Token usage for cost tracking
    pub usage: TokenUsage,
}

/// Token usage for cost tracking
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
