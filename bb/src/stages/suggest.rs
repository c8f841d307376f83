//! Recommendation stages - next steps and teammate outreach
//!
//! Both stages speak directly to the user. Next steps come from the
//! model with a deterministic checklist fallback. The teammate stage
//! ranks the team by skill overlap first and only asks the model to
//! draft the outreach message, so the recommended person never depends
//! on model output.

use std::sync::Arc;

use blockerstore::{RetrievalStore, Scored, TeamMember};
use tracing::{debug, info, warn};

use crate::domain::{AttemptsRecord, MatchResult, TriageRecord};
use crate::llm::{CompletionRequest, LlmClient};
use crate::surface::DialogueSurface;

const STEPS_SYSTEM_PROMPT: &str = "Propose 3-6 concrete next steps as a short plain-text checklist, \
     one step per line, each line starting with '- '. Order by expected payoff. \
     Reference the matched historical resolution when one exists.";

const OUTREACH_SYSTEM_PROMPT: &str = "Draft a short Slack-ready outreach message (2-3 sentences) asking the \
     named teammate for help with the blocker. Include the key symptom and what was already tried.";

/// Dialogue stage proposing a checklist of next steps
pub struct SuggestStepsStage {
    llm: Arc<dyn LlmClient>,
}

impl SuggestStepsStage {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Build and present the checklist
    pub async fn run(
        &self,
        surface: &mut dyn DialogueSurface,
        triage: &TriageRecord,
        attempts: &AttemptsRecord,
        match_result: &MatchResult,
    ) -> eyre::Result<String> {
        debug!("SuggestStepsStage::run: called");

        let context = serde_json::json!({
            "blocker": triage,
            "attempts": attempts.items,
            "matched": match_result.matched().map(|m| serde_json::json!({
                "title": m.item.title,
                "resolution": m.item.resolution,
            })),
        });
        let request = CompletionRequest::one_shot(STEPS_SYSTEM_PROMPT, context.to_string());

        let steps = match self.llm.complete(request).await {
            Ok(response) => {
                let steps = response.content.trim().to_string();
                if steps.is_empty() {
                    warn!("SuggestStepsStage: empty checklist, using fallback");
                    fallback_steps(triage, match_result)
                } else {
                    steps
                }
            }
            Err(e) => {
                warn!(error = %e, "SuggestStepsStage: model call failed, using fallback");
                fallback_steps(triage, match_result)
            }
        };

        surface.say(&format!("Proposed next steps:\n{steps}")).await?;
        info!("Next steps presented");
        Ok(steps)
    }
}

/// Deterministic checklist used when generation fails
fn fallback_steps(triage: &TriageRecord, match_result: &MatchResult) -> String {
    let mut steps = Vec::new();
    if let Some(matched) = match_result.matched() {
        if let Some(resolution) = &matched.item.resolution {
            steps.push(format!("- Try the fix that worked for '{}': {}", matched.item.title, resolution));
        }
    }
    steps.push(format!("- Reproduce the issue in {} and capture request/response logs", triage.environment));
    steps.push("- Check recent deploys and feature flag changes for the affected service".to_string());
    steps.push("- Compare the failing environment's config against one where it works".to_string());
    steps.join("\n")
}

/// Dialogue stage recommending a teammate and drafting outreach
pub struct SuggestPersonStage {
    llm: Arc<dyn LlmClient>,
    store: Arc<RetrievalStore>,
    skills_needed: Vec<String>,
}

impl SuggestPersonStage {
    pub fn new(llm: Arc<dyn LlmClient>, store: Arc<RetrievalStore>, skills_needed: Vec<String>) -> Self {
        Self {
            llm,
            store,
            skills_needed,
        }
    }

    /// Pick the best-overlapping teammate and present the recommendation
    pub async fn run(
        &self,
        surface: &mut dyn DialogueSurface,
        triage: &TriageRecord,
        attempts: &AttemptsRecord,
    ) -> eyre::Result<Option<Scored<TeamMember>>> {
        debug!("SuggestPersonStage::run: called");

        let ranked = self.store.find_team_candidates(&self.skills_needed);
        let Some(best) = ranked.into_iter().next() else {
            surface
                .say("No teammate in the directory matches the skills this blocker needs. I'd escalate to your lead.")
                .await?;
            info!("No teammate candidate found");
            return Ok(None);
        };

        let message = self.outreach_message(&best.item, triage, attempts).await;
        surface
            .say(&format!(
                "I'd loop in {} ({}) - Slack: {}\nSuggested message: {}",
                best.item.name, best.item.role, best.item.contact.slack, message
            ))
            .await?;

        info!(name = %best.item.name, overlap = best.score, "Teammate recommended");
        Ok(Some(best))
    }

    /// Model-drafted outreach, or a deterministic message
    async fn outreach_message(&self, member: &TeamMember, triage: &TriageRecord, attempts: &AttemptsRecord) -> String {
        let context = serde_json::json!({
            "teammate": {"name": member.name, "role": member.role, "skills": member.skills},
            "blocker": triage,
            "attempts": attempts.items,
        });
        let request = CompletionRequest::one_shot(OUTREACH_SYSTEM_PROMPT, context.to_string());

        match self.llm.complete(request).await {
            Ok(response) => response.content.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "SuggestPersonStage: model call failed, using deterministic message");
                fallback_outreach(member, triage, attempts)
            }
        }
    }
}

/// Plain outreach message assembled from the records
fn fallback_outreach(member: &TeamMember, triage: &TriageRecord, attempts: &AttemptsRecord) -> String {
    let tried = if attempts.items.is_empty() {
        "nothing conclusive yet".to_string()
    } else {
        attempts.items.join("; ")
    };
    format!(
        "Hi {}, I'm blocked on '{}' in {} and could use your eyes. So far I've tried: {}. Do you have a few minutes today?",
        member.name, triage.title, triage.environment, tried
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use blockerstore::{Datasets, Embedder, EmbedderError};
    use crate::llm::fallback_embedding;
    use crate::llm::mock::MockLlmClient;
    use crate::surface::ScriptedSurface;

    struct OfflineEmbedder;

    #[async_trait]
    impl Embedder for OfflineEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
            Ok(fallback_embedding(text, 64))
        }
    }

    async fn sample_store() -> Arc<RetrievalStore> {
        Arc::new(
            RetrievalStore::build(Datasets::sample(), Arc::new(OfflineEmbedder))
                .await
                .unwrap(),
        )
    }

    fn triage() -> TriageRecord {
        TriageRecord {
            title: "Sentiment widget blank".to_string(),
            impact: "demo at risk".to_string(),
            reproducibility: "100%".to_string(),
            environment: "staging".to_string(),
            notes: "empty payload".to_string(),
        }
    }

    #[tokio::test]
    async fn test_steps_from_model_presented() {
        let llm = Arc::new(MockLlmClient::with_responses(vec![
            "- Check the flag\n- Redeploy the model",
        ]));
        let stage = SuggestStepsStage::new(llm);
        let mut surface = ScriptedSurface::new(vec![]);

        let steps = stage
            .run(&mut surface, &triage(), &AttemptsRecord::default(), &MatchResult::empty())
            .await
            .unwrap();
        assert!(steps.contains("Check the flag"));
        assert!(surface.said[0].starts_with("Proposed next steps:"));
    }

    #[tokio::test]
    async fn test_steps_fallback_references_matched_resolution() {
        let stage = SuggestStepsStage::new(Arc::new(MockLlmClient::failing()));
        let candidates = sample_store().await.search_blockers("sentiment widget", 3).await.unwrap();
        let match_result = MatchResult::new(candidates, Some(0));
        let mut surface = ScriptedSurface::new(vec![]);

        let steps = stage
            .run(&mut surface, &triage(), &AttemptsRecord::default(), &match_result)
            .await
            .unwrap();
        let resolution = match_result.matched().unwrap().item.resolution.clone();
        if let Some(resolution) = resolution {
            assert!(steps.contains(&resolution));
        }
        assert!(steps.contains("staging"));
    }

    #[tokio::test]
    async fn test_person_recommended_by_overlap_not_model() {
        // Model failure must not change who gets recommended
        let stage = SuggestPersonStage::new(
            Arc::new(MockLlmClient::failing()),
            sample_store().await,
            vec!["NLP".to_string(), "Model Debugging".to_string()],
        );
        let mut surface = ScriptedSurface::new(vec![]);

        let best = stage
            .run(&mut surface, &triage(), &AttemptsRecord::default())
            .await
            .unwrap()
            .expect("should recommend someone");
        assert_eq!(best.item.name, "Priya Raman");
        assert!(surface.said[0].contains("@priya"));
        assert!(surface.said[0].contains("Hi Priya Raman"));
    }

    #[tokio::test]
    async fn test_no_overlap_says_escalate() {
        let stage = SuggestPersonStage::new(
            Arc::new(MockLlmClient::failing()),
            sample_store().await,
            vec!["COBOL".to_string()],
        );
        let mut surface = ScriptedSurface::new(vec![]);

        let best = stage
            .run(&mut surface, &triage(), &AttemptsRecord::default())
            .await
            .unwrap();
        assert!(best.is_none());
        assert!(surface.said[0].contains("escalate"));
    }

    #[tokio::test]
    async fn test_outreach_uses_model_draft_when_available() {
        let stage = SuggestPersonStage::new(
            Arc::new(MockLlmClient::with_responses(vec!["Hey Priya, quick look at the widget?"])),
            sample_store().await,
            vec!["NLP".to_string()],
        );
        let mut surface = ScriptedSurface::new(vec![]);

        stage
            .run(&mut surface, &triage(), &AttemptsRecord::default())
            .await
            .unwrap();
        assert!(surface.said[0].contains("Hey Priya, quick look at the widget?"));
    }

    #[test]
    fn test_fallback_outreach_mentions_attempts() {
        let member = Datasets::sample().team[0].clone();
        let attempts = AttemptsRecord {
            items: vec!["restarted pod".to_string()],
        };
        let message = fallback_outreach(&member, &triage(), &attempts);
        assert!(message.contains("restarted pod"));
        assert!(message.contains("Sentiment widget blank"));
    }
}
