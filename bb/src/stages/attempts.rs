//! Attempts stage - what the developer has already tried

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::AttemptsRecord;
use crate::llm::{CompletionRequest, LlmClient};
use crate::parse::parse_lenient;

const PROMPT: &str =
    "What have you already tried? Name specifics like toggles, retries, rollbacks, config changes, quick fixes.";

const SYSTEM_PROMPT: &str =
    "Extract a bullet list of concrete attempts from the user's answer. Return a JSON array of short strings.";

/// Accepts either a bare array or an object with an `items` key
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AttemptsOutput {
    List(Vec<String>),
    Object { items: Vec<String> },
}

impl AttemptsOutput {
    fn into_items(self) -> Vec<String> {
        match self {
            AttemptsOutput::List(items) => items,
            AttemptsOutput::Object { items } => items,
        }
    }
}

/// Dialogue stage producing the AttemptsRecord
pub struct AttemptsStage {
    llm: Arc<dyn LlmClient>,
}

impl AttemptsStage {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Ask one fixed prompt and extract attempts as short strings
    pub async fn run(&self, surface: &mut dyn crate::surface::DialogueSurface) -> eyre::Result<AttemptsRecord> {
        debug!("AttemptsStage::run: called");

        let raw = surface.ask(PROMPT).await?.trim().to_string();
        let items = self.extract(&raw).await;
        let record = AttemptsRecord {
            items: items
                .into_iter()
                .map(|i| i.trim().to_string())
                .filter(|i| !i.is_empty())
                .collect(),
        };

        info!(count = record.items.len(), "Attempts recorded");
        Ok(record)
    }

    /// Extract a list from the raw answer; fallback wraps it as one item
    async fn extract(&self, raw: &str) -> Vec<String> {
        let request = CompletionRequest::one_shot(SYSTEM_PROMPT, raw);

        match self.llm.complete(request).await {
            Ok(response) => match parse_lenient::<AttemptsOutput>(&response.content) {
                Ok(output) => output.into_items(),
                Err(e) => {
                    warn!(error = %e, "AttemptsStage: unparseable extraction, wrapping raw answer");
                    vec![raw.to_string()]
                }
            },
            Err(e) => {
                warn!(error = %e, "AttemptsStage: model call failed, wrapping raw answer");
                vec![raw.to_string()]
            }
        }
    }
}
