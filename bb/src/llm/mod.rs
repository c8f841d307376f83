//! LLM client module for BlockerBot
//!
//! Provides LLM completion and embedding requests with bounded
//! retry/backoff and a deterministic offline embedding fallback.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use tracing::debug;

mod client;
mod error;
mod openai;
mod types;

pub use client::LlmClient;
#[cfg(test)]
pub use client::mock;
pub use error::LlmError;
pub use openai::OpenAiClient;
pub use types::{CompletionRequest, CompletionResponse, Message, Role, TokenUsage};

use crate::config::LlmConfig;

/// Dimension of the deterministic fallback embedding
pub const FALLBACK_EMBED_DIM: usize = 384;

/// Create an LLM client based on the provider specified in config
///
/// Currently only "openai" (and OpenAI-compatible endpoints) are supported.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiClient::from_config(config)?)),
        other => Err(LlmError::InvalidResponse(format!(
            "Unknown LLM provider: '{}'. Supported: openai",
            other
        ))),
    }
}

/// Deterministic pseudo-random embedding seeded from the text's hash
///
/// Used when the embedding endpoint is unreachable after retries. The
/// vector is repeatable for the same input, so offline similarity search
/// stays stable (though non-semantic).
pub fn fallback_embedding(text: &str, dim: usize) -> Vec<f32> {
    debug!(text_len = text.len(), dim, "fallback_embedding: called");
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    let mut rng = StdRng::seed_from_u64(hasher.finish());
    (0..dim).map(|_| rng.random_range(-1.0f32..1.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_embedding_deterministic() {
        let a = fallback_embedding("widget blank in staging", 64);
        let b = fallback_embedding("widget blank in staging", 64);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fallback_embedding_differs_by_text() {
        let a = fallback_embedding("alpha", 64);
        let b = fallback_embedding("beta", 64);
        assert_ne!(a, b);
    }

    #[test]
    fn test_fallback_embedding_dimension_and_range() {
        let v = fallback_embedding("anything", FALLBACK_EMBED_DIM);
        assert_eq!(v.len(), FALLBACK_EMBED_DIM);
        assert!(v.iter().all(|x| (-1.0..1.0).contains(x)));
    }

    #[test]
    fn test_create_client_unknown_provider() {
        let config = LlmConfig {
            provider: "acme".to_string(),
            ..LlmConfig::default()
        };
        assert!(create_client(&config).is_err());
    }
}
