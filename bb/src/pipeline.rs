//! Session coordinator - stage ordering and the concurrency window
//!
//! The coordinator owns one instance of every stage and runs them in a
//! fixed order. Background retrieval is spawned the moment triage
//! completes and joined right before line-item generation, so the only
//! dialogue turn it overlaps is the attempts question. A retrieval task
//! that panics or fails degrades to an empty context; the session never
//! aborts because background work misbehaved.

use std::sync::Arc;

use blockerstore::{RetrievalStore, Scored, TeamMember};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::domain::{AttemptsRecord, LineItem, LineItemAnswer, MatchResult, RetrievalContext, TriageRecord};
use crate::llm::LlmClient;
use crate::stages::{
    AttemptsStage, FinalMatchStage, InterviewStage, LineItemStage, RetrievalStage, SuggestPersonStage,
    SuggestStepsStage, SummarizeStage, TriageStage,
};
use crate::surface::DialogueSurface;

/// Everything one session produced, in stage order
#[derive(Debug, Clone)]
pub struct SessionRecords {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub triage: TriageRecord,
    pub attempts: AttemptsRecord,
    pub line_items: Vec<LineItem>,
    pub answers: Vec<LineItemAnswer>,
    pub summary_confirmed: bool,
    pub match_result: MatchResult,
    pub next_steps: String,
    pub teammate: Option<Scored<TeamMember>>,
}

/// Runs the staged dialogue pipeline over one surface
pub struct PipelineCoordinator {
    triage: TriageStage,
    attempts: AttemptsStage,
    retrieval: Arc<RetrievalStage>,
    line_items: LineItemStage,
    interview: InterviewStage,
    summarize: SummarizeStage,
    final_match: FinalMatchStage,
    suggest_steps: SuggestStepsStage,
    suggest_person: SuggestPersonStage,
    auto_confirm_threshold: f32,
    detail_threshold: f32,
}

impl PipelineCoordinator {
    pub fn new(llm: Arc<dyn LlmClient>, store: Arc<RetrievalStore>, config: &Config) -> Self {
        debug!("PipelineCoordinator::new: called");
        Self {
            triage: TriageStage::new(llm.clone()),
            attempts: AttemptsStage::new(llm.clone()),
            retrieval: Arc::new(RetrievalStage::new(store.clone(), config.retrieval.clone())),
            line_items: LineItemStage::new(llm.clone()),
            interview: InterviewStage::new(),
            summarize: SummarizeStage::new(llm.clone()),
            final_match: FinalMatchStage::new(llm.clone(), store.clone(), config.retrieval.match_top_k),
            suggest_steps: SuggestStepsStage::new(llm.clone()),
            suggest_person: SuggestPersonStage::new(llm, store, config.session.skills_needed.clone()),
            auto_confirm_threshold: config.retrieval.auto_confirm_threshold,
            detail_threshold: config.retrieval.detail_threshold,
        }
    }

    /// Run one full session over the given surface
    pub async fn run_session(&self, surface: &mut dyn DialogueSurface) -> eyre::Result<SessionRecords> {
        let session_id = Uuid::now_v7();
        let started_at = Utc::now();
        info!(%session_id, "Session started");

        let triage = self.triage.run(surface).await?;

        // Retrieval overlaps the attempts dialogue turn
        let retrieval = self.retrieval.clone();
        let retrieval_input = triage.clone();
        let retrieval_task = tokio::spawn(async move { retrieval.run(&retrieval_input).await });

        let attempts = self.attempts.run(surface).await?;

        // Join barrier: line items need the retrieved context
        let context = match retrieval_task.await {
            Ok(context) => context,
            Err(e) => {
                warn!(error = %e, "Retrieval task failed, continuing with empty context");
                RetrievalContext::default()
            }
        };

        let line_items = self.line_items.run(&triage, &context).await;
        let answers = self.interview.run(surface, &line_items).await?;

        let summary_confirmed = self.summarize.run(surface, &triage, &attempts, &answers).await?;
        if !summary_confirmed {
            surface
                .say("Okay, I'll tweak the summary based on your feedback and proceed.")
                .await?;
        }

        let match_result = self.final_match.run(&triage, &attempts, &answers).await;
        surface
            .say(&match_report(&match_result, self.auto_confirm_threshold, self.detail_threshold))
            .await?;

        let next_steps = self
            .suggest_steps
            .run(surface, &triage, &attempts, &match_result)
            .await?;
        let teammate = self.suggest_person.run(surface, &triage, &attempts).await?;

        info!(%session_id, "Session complete");
        Ok(SessionRecords {
            session_id,
            started_at,
            triage,
            attempts,
            line_items,
            answers,
            summary_confirmed,
            match_result,
            next_steps,
            teammate,
        })
    }

}

/// Human-readable verdict on the historical match
fn match_report(result: &MatchResult, auto_confirm_threshold: f32, detail_threshold: f32) -> String {
    match result.matched() {
        Some(matched) => {
            let confidence = if matched.score >= auto_confirm_threshold {
                "high confidence"
            } else if matched.score >= detail_threshold {
                "moderate confidence, worth double-checking the details"
            } else {
                "low confidence, treat it as a loose lead"
            };
            let resolution = matched
                .item
                .resolution
                .as_deref()
                .unwrap_or("no recorded resolution");
            format!(
                "Closest historical match: '{}' ({}, similarity {:.2}, {}).\nHow it was resolved: {}",
                matched.item.title, matched.item.id, matched.score, confidence, resolution
            )
        }
        None => "No match found among historical blockers. This looks like a new issue.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockerstore::BlockerCandidate;

    fn result_with_score(score: f32) -> MatchResult {
        MatchResult::new(
            vec![Scored {
                item: BlockerCandidate {
                    id: "b-1".to_string(),
                    title: "Old blocker".to_string(),
                    summary: String::new(),
                    resolution: Some("restarted the service".to_string()),
                    tags: vec![],
                },
                score,
            }],
            Some(0),
        )
    }

    #[test]
    fn test_match_report_confidence_tiers() {
        assert!(match_report(&result_with_score(0.92), 0.80, 0.50).contains("high confidence"));
        assert!(match_report(&result_with_score(0.65), 0.80, 0.50).contains("moderate confidence"));
        assert!(match_report(&result_with_score(0.30), 0.80, 0.50).contains("low confidence"));
    }

    #[test]
    fn test_match_report_no_match() {
        let report = match_report(&MatchResult::empty(), 0.80, 0.50);
        assert!(report.contains("No match found"));
    }

    #[test]
    fn test_match_report_includes_resolution() {
        let report = match_report(&result_with_score(0.9), 0.80, 0.50);
        assert!(report.contains("restarted the service"));
        assert!(report.contains("b-1"));
    }
}
