//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless LLM client - each call is independent
///
/// This is the core abstraction stages use to talk to the model. Each
/// completion request carries its full context; no conversation state is
/// maintained between calls, which keeps every stage independently
/// testable and replayable.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request (blocking until complete)
    ///
    /// Fails after exhausting retries; the calling stage applies its
    /// parse-or-fallback discipline on error.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Embed a text into a fixed-length vector
    ///
    /// Implementations degrade to a deterministic offline vector after
    /// retry exhaustion rather than failing, so similarity search keeps
    /// working (non-semantically) without a provider.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::llm::fallback_embedding;
    use crate::llm::types::TokenUsage;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::debug;

    /// Mock LLM client for unit tests
    ///
    /// Serves scripted responses in order; `Err` entries simulate a
    /// provider failure after retry exhaustion.
    pub struct MockLlmClient {
        responses: Mutex<VecDeque<Result<String, String>>>,
        call_count: AtomicUsize,
    }

    impl MockLlmClient {
        pub fn new(responses: Vec<Result<String, String>>) -> Self {
            debug!(response_count = responses.len(), "MockLlmClient::new: called");
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                call_count: AtomicUsize::new(0),
            }
        }

        /// All calls succeed with the given texts, in order
        pub fn with_responses(texts: Vec<&str>) -> Self {
            Self::new(texts.into_iter().map(|t| Ok(t.to_string())).collect())
        }

        /// Every call fails (simulates retry exhaustion)
        pub fn failing() -> Self {
            Self::new(vec![])
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            let next = self.responses.lock().expect("mock lock poisoned").pop_front();
            match next {
                Some(Ok(content)) => Ok(CompletionResponse {
                    content,
                    usage: TokenUsage::default(),
                }),
                Some(Err(message)) => Err(LlmError::InvalidResponse(message)),
                None => Err(LlmError::InvalidResponse("No more mock responses".to_string())),
            }
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
            Ok(fallback_embedding(text, 32))
        }
    }
}
