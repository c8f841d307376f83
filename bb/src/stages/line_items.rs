//! Line-item generation stage
//!
//! Consumes the triage record plus the background retrieval context and
//! asks the model for a JSON array of clarifying questions biased toward
//! technical specifics. Any shape failure (unparseable output, invalid
//! element, duplicate id, empty batch) replaces the whole batch with a
//! static two-item fallback set, so the interview always has questions.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{LineItem, Priority, RetrievalContext, TriageRecord};
use crate::llm::{CompletionRequest, LlmClient};
use crate::parse::parse_lenient;

const SYSTEM_PROMPT: &str = "You generate voice-first follow-up questions as a JSON array of objects with keys: \
     id, question, expected_type, why_it_matters, required (bool), priority (high|medium|low). \
     Questions must be answerable by speech (no links or uploads). Keep them short. \
     Bias questions toward feature flags, ML service versions, cross-team dependencies, and environment specifics.";

/// Background-fed stage producing the LineItem batch
pub struct LineItemStage {
    llm: Arc<dyn LlmClient>,
}

impl LineItemStage {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Generate clarifying questions from triage + retrieved context
    pub async fn run(&self, triage: &TriageRecord, context: &RetrievalContext) -> Vec<LineItem> {
        debug!("LineItemStage::run: called");

        let stage_context = serde_json::json!({
            "triage_record": triage,
            "tickets": context.tickets,
            "glossary": context.glossary,
            "blocker_candidate_titles": context
                .blocker_candidates
                .iter()
                .map(|c| c.item.title.as_str())
                .collect::<Vec<_>>(),
        });

        let request = CompletionRequest::one_shot(SYSTEM_PROMPT, stage_context.to_string());

        let items = match self.llm.complete(request).await {
            Ok(response) => match parse_lenient::<Vec<LineItem>>(&response.content) {
                Ok(items) => items,
                Err(e) => {
                    warn!(error = %e, "LineItemStage: unparseable batch, using fallback set");
                    fallback_items()
                }
            },
            Err(e) => {
                warn!(error = %e, "LineItemStage: model call failed, using fallback set");
                fallback_items()
            }
        };

        let items = if batch_is_valid(&items) {
            items
        } else {
            warn!("LineItemStage: invalid batch shape, using fallback set");
            fallback_items()
        };

        info!(count = items.len(), "Line items generated");
        items
    }
}

/// Batch validity: non-empty, non-blank fields, unique ids
fn batch_is_valid(items: &[LineItem]) -> bool {
    if items.is_empty() {
        return false;
    }

    let mut seen = HashSet::new();
    for item in items {
        if item.id.trim().is_empty() || item.question.trim().is_empty() {
            return false;
        }
        if !seen.insert(item.id.as_str()) {
            debug!(id = %item.id, "batch_is_valid: duplicate id");
            return false;
        }
    }
    true
}

/// Static minimal question set used when generation fails
fn fallback_items() -> Vec<LineItem> {
    vec![
        LineItem {
            id: "li_voice_01".to_string(),
            question: "Is the widget gated by any feature flags in staging?".to_string(),
            expected_type: "yes_no_or_name".to_string(),
            why_it_matters: "Flags commonly hide UI in non-prod".to_string(),
            required: true,
            priority: Priority::High,
        },
        LineItem {
            id: "li_voice_02".to_string(),
            question: "Do you know if the ML model version in staging changed recently?".to_string(),
            expected_type: "short_text".to_string(),
            why_it_matters: "Stale model artifacts cause blanks".to_string(),
            required: true,
            priority: Priority::High,
        },
    ]
}
