//! Summarize-and-confirm stage
//!
//! Builds a JSON context from everything gathered so far, asks the
//! model for a 2-3 sentence summary, and asks the user to confirm. A
//! negative confirmation is acknowledged by the coordinator but does
//! not block the pipeline from proceeding.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{AttemptsRecord, LineItemAnswer, TriageRecord};
use crate::llm::{CompletionRequest, LlmClient};
use crate::surface::DialogueSurface;

const SYSTEM_PROMPT: &str =
    "Summarize the blocker in 2-3 sentences, crisp, including environment, impact, key hypothesis.";

/// Dialogue stage producing the confirmation boolean
pub struct SummarizeStage {
    llm: Arc<dyn LlmClient>,
}

impl SummarizeStage {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Summarize and ask for confirmation; returns the user's verdict
    pub async fn run(
        &self,
        surface: &mut dyn DialogueSurface,
        triage: &TriageRecord,
        attempts: &AttemptsRecord,
        answers: &[LineItemAnswer],
    ) -> eyre::Result<bool> {
        debug!("SummarizeStage::run: called");

        let summary = self.summarize(triage, attempts, answers).await;
        let confirmed = surface
            .confirm(&format!("Here is the summary I will share: {summary}\nIs this correct?"))
            .await?;

        info!(confirmed, "Summary confirmation received");
        Ok(confirmed)
    }

    /// Model summary, or a deterministic one built from the records
    async fn summarize(&self, triage: &TriageRecord, attempts: &AttemptsRecord, answers: &[LineItemAnswer]) -> String {
        let context = serde_json::json!({
            "triage": triage,
            "attempts": attempts.items,
            "answers": answers,
        });
        let request = CompletionRequest::one_shot(SYSTEM_PROMPT, context.to_string());

        match self.llm.complete(request).await {
            Ok(response) => response.content.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "SummarizeStage: model call failed, using deterministic summary");
                fallback_summary(triage, attempts)
            }
        }
    }
}

/// Conservative summary assembled from the raw records
fn fallback_summary(triage: &TriageRecord, attempts: &AttemptsRecord) -> String {
    let tried = if attempts.items.is_empty() {
        "nothing yet".to_string()
    } else {
        attempts.items.join("; ")
    };
    format!(
        "{} in {} (repro: {}). Impact: {}. Tried so far: {}.",
        triage.title, triage.environment, triage.reproducibility, triage.impact, tried
    )
}
