//! BlockerBot configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main BlockerBot configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Retrieval store configuration
    pub retrieval: RetrievalConfig,

    /// Session behavior configuration
    pub session: SessionConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    /// Demo mode skips this and degrades to offline fallbacks instead.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.llm.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .blockerbot.yml
        let local_config = PathBuf::from(".blockerbot.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/blockerbot/blockerbot.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("blockerbot").join("blockerbot.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (currently only "openai" supported)
    pub provider: String,

    /// Chat model identifier
    pub model: String,

    /// Embedding model identifier
    #[serde(rename = "embedding-model")]
    pub embedding_model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env).context(format!("{} not set", self.api_key_env))
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com".to_string(),
            max_tokens: 2048,
            timeout_ms: 60_000,
        }
    }
}

/// Retrieval store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Directory containing the JSON datasets; bundled sample data when unset
    #[serde(rename = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Top-K for background ticket search
    #[serde(rename = "ticket-top-k")]
    pub ticket_top_k: usize,

    /// Top-K for background blocker-candidate search
    #[serde(rename = "blocker-top-k")]
    pub blocker_top_k: usize,

    /// Top-K for the final match stage
    #[serde(rename = "match-top-k")]
    pub match_top_k: usize,

    /// Fixed term set for the background glossary lookup
    #[serde(rename = "glossary-terms")]
    pub glossary_terms: Vec<String>,

    /// Similarity above which a match would be auto-confirmed
    #[serde(rename = "auto-confirm-threshold")]
    pub auto_confirm_threshold: f32,

    /// Similarity below which more detail should be requested
    #[serde(rename = "detail-threshold")]
    pub detail_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            ticket_top_k: 5,
            blocker_top_k: 8,
            match_top_k: 5,
            glossary_terms: vec!["sentiment-widget".to_string(), "ml-service".to_string()],
            auto_confirm_threshold: 0.80,
            detail_threshold: 0.50,
        }
    }
}

/// Session behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Skill hints for the suggested-teammate stage
    #[serde(rename = "skills-needed")]
    pub skills_needed: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            skills_needed: vec![
                "NLP".to_string(),
                "Flask API".to_string(),
                "Model Debugging".to_string(),
            ],
        }
    }
}
