//! Historical match stage
//!
//! Re-queries the blocker index with everything learned during the
//! session, then asks the model to pick the single best candidate by
//! id. The result always satisfies one rule: the matched record, when
//! present, is one of the candidates shown to the model.

use std::sync::Arc;

use blockerstore::RetrievalStore;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::{AttemptsRecord, LineItemAnswer, MatchResult, TriageRecord};
use crate::llm::{CompletionRequest, LlmClient};
use crate::parse::parse_lenient;

const SYSTEM_PROMPT: &str = "You match a new blocker against historical candidates. \
     Return JSON: {\"best_id\": \"<candidate id or null>\", \"reasons\": [\"...\"]}. \
     Use null when no candidate describes the same underlying problem.";

/// Model verdict over the candidate list
#[derive(Debug, Deserialize)]
struct MatchOutput {
    best_id: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    reasons: Vec<String>,
}

/// Background-fed stage producing the MatchResult
pub struct FinalMatchStage {
    llm: Arc<dyn LlmClient>,
    store: Arc<RetrievalStore>,
    top_k: usize,
}

impl FinalMatchStage {
    pub fn new(llm: Arc<dyn LlmClient>, store: Arc<RetrievalStore>, top_k: usize) -> Self {
        Self { llm, store, top_k }
    }

    /// Full-session query string for the final similarity pass
    pub fn query_for(triage: &TriageRecord, attempts: &AttemptsRecord, answers: &[LineItemAnswer]) -> String {
        let answer_text: Vec<String> = answers
            .iter()
            .map(|a| format!("{}: {}", a.id, a.answer))
            .collect();
        format!(
            "{}. env={}. repro={}. attempts={}. answers={}",
            triage.title,
            triage.environment,
            triage.reproducibility,
            attempts.items.join("; "),
            answer_text.join("; "),
        )
    }

    /// Search, then resolve the model's pick against the candidate list
    pub async fn run(
        &self,
        triage: &TriageRecord,
        attempts: &AttemptsRecord,
        answers: &[LineItemAnswer],
    ) -> MatchResult {
        debug!("FinalMatchStage::run: called");

        let query = Self::query_for(triage, attempts, answers);
        let candidates = match self.store.search_blockers(&query, self.top_k).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, "FinalMatchStage: candidate search failed");
                Vec::new()
            }
        };

        if candidates.is_empty() {
            info!("FinalMatchStage: no candidates, skipping model pick");
            return MatchResult::empty();
        }

        let context = serde_json::json!({
            "blocker": triage,
            "attempts": attempts.items,
            "answers": answers,
            "candidates": candidates
                .iter()
                .map(|c| serde_json::json!({
                    "id": c.item.id,
                    "title": c.item.title,
                    "resolution": c.item.resolution,
                    "similarity": c.score,
                }))
                .collect::<Vec<_>>(),
        });
        let request = CompletionRequest::one_shot(SYSTEM_PROMPT, context.to_string());

        let matched_index = match self.llm.complete(request).await {
            Ok(response) => match parse_lenient::<MatchOutput>(&response.content) {
                Ok(MatchOutput { best_id: None, .. }) => None,
                Ok(MatchOutput { best_id: Some(id), .. }) => {
                    let found = candidates.iter().position(|c| c.item.id == id);
                    if found.is_none() {
                        warn!(%id, "FinalMatchStage: model picked unknown id, taking top candidate");
                    }
                    Some(found.unwrap_or(0))
                }
                Err(e) => {
                    warn!(error = %e, "FinalMatchStage: unparseable pick, taking top candidate");
                    Some(0)
                }
            },
            Err(e) => {
                warn!(error = %e, "FinalMatchStage: model call failed, taking top candidate");
                Some(0)
            }
        };

        let result = MatchResult::new(candidates, matched_index);
        info!(matched = result.matched().is_some(), "Final match resolved");
        result
    }
}
