//! Triage stage - fast structured capture of the blocker
//!
//! Asks exactly three fixed prompts, then normalizes the raw answers
//! into the five TriageRecord fields via the LLM, with deterministic
//! heuristics and a raw-text fallback when normalization fails.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::TriageRecord;
use crate::llm::{CompletionRequest, LlmClient};
use crate::parse::parse_lenient;

const PROMPT_HEADLINE: &str = "Quick headline and business impact?";
const PROMPT_ENV_REPRO: &str = "Where does it reproduce (env) and how consistently?";
const PROMPT_NOTES: &str = "Any brief notes I should know right away?";

const SYSTEM_PROMPT: &str = "You are a strict triage normalizer. Given freeform answers, produce a JSON \
     object with keys: title, impact, reproducibility, environment, notes. Use concise phrases.";

/// LLM output shape; missing keys resolve through the heuristics below
#[derive(Debug, Clone, Default, Deserialize)]
struct TriageOutput {
    title: Option<String>,
    impact: Option<String>,
    reproducibility: Option<String>,
    environment: Option<String>,
    notes: Option<String>,
}

/// Dialogue stage producing the TriageRecord
pub struct TriageStage {
    llm: Arc<dyn LlmClient>,
}

impl TriageStage {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Collect fast triage in three turns and normalize into a record
    pub async fn run(&self, surface: &mut dyn crate::surface::DialogueSurface) -> eyre::Result<TriageRecord> {
        debug!("TriageStage::run: called");

        let title_impact = surface.ask(PROMPT_HEADLINE).await?.trim().to_string();
        let env_repro = surface.ask(PROMPT_ENV_REPRO).await?.trim().to_string();
        let notes = surface.ask(PROMPT_NOTES).await?.trim().to_string();

        let output = self.normalize(&title_impact, &env_repro, &notes).await;
        let record = build_record(output, &title_impact, &env_repro, &notes);

        info!(title = %record.title, environment = %record.environment, "Triage complete");
        Ok(record)
    }

    /// Ask the model to normalize the raw answers; default shape on failure
    async fn normalize(&self, title_impact: &str, env_repro: &str, notes: &str) -> TriageOutput {
        let content = format!("Answers:\n1) {title_impact}\n2) {env_repro}\n3) {notes}");
        let request = CompletionRequest::one_shot(SYSTEM_PROMPT, content);

        match self.llm.complete(request).await {
            Ok(response) => match parse_lenient::<TriageOutput>(&response.content) {
                Ok(output) => output,
                Err(e) => {
                    warn!(error = %e, "TriageStage: unparseable normalization, using raw answers");
                    TriageOutput::default()
                }
            },
            Err(e) => {
                warn!(error = %e, "TriageStage: model call failed, using raw answers");
                TriageOutput::default()
            }
        }
    }
}

/// Apply defaults and heuristics so all five fields are non-empty
///
/// Reproducibility: "100%" when the env answer mentions "every", else
/// "intermittent". Environment defaults to "staging" when unstated.
fn build_record(output: TriageOutput, title_impact: &str, env_repro: &str, notes: &str) -> TriageRecord {
    let inferred_repro = if env_repro.to_lowercase().contains("every") {
        "100%"
    } else {
        "intermittent"
    };

    TriageRecord {
        title: pick(output.title, title_impact, "unspecified"),
        impact: pick(output.impact, "", "unspecified"),
        reproducibility: pick(output.reproducibility, "", inferred_repro),
        environment: pick(output.environment, "", "staging"),
        notes: pick(output.notes, notes, "none"),
    }
}

/// First non-empty of: model output, raw answer, static default
fn pick(primary: Option<String>, raw: &str, default: &str) -> String {
    if let Some(value) = primary {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let raw = raw.trim();
    if raw.is_empty() { default.to_string() } else { raw.to_string() }
}
