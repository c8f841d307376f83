//! Line-item interview stage - pure dialogue sequencing
//!
//! Asks each generated question verbatim in priority order (high, then
//! medium, then low; stable within a tier) and records one answer per
//! item in ask order. No model call happens here.

use tracing::{debug, info};

use crate::domain::{LineItem, LineItemAnswer};
use crate::surface::DialogueSurface;

/// Dialogue stage producing the LineItemAnswer list
pub struct InterviewStage;

impl InterviewStage {
    pub fn new() -> Self {
        Self
    }

    /// Ask all line items and collect the answers
    pub async fn run(&self, surface: &mut dyn DialogueSurface, items: &[LineItem]) -> eyre::Result<Vec<LineItemAnswer>> {
        debug!(item_count = items.len(), "InterviewStage::run: called");

        let mut answers = Vec::with_capacity(items.len());
        for item in ask_order(items) {
            let answer = surface.ask(&item.question).await?.trim().to_string();
            answers.push(LineItemAnswer {
                id: item.id.clone(),
                answer,
            });
        }

        info!(answer_count = answers.len(), "Interview complete");
        Ok(answers)
    }
}

impl Default for InterviewStage {
    fn default() -> Self {
        Self::new()
    }
}

/// Items in ask order: priority rank ascending, stable within a tier
fn ask_order(items: &[LineItem]) -> Vec<&LineItem> {
    let mut ordered: Vec<&LineItem> = items.iter().collect();
    ordered.sort_by_key(|item| item.priority.rank());
    ordered
}
