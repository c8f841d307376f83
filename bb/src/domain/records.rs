//! Core pipeline record types

use blockerstore::{BlockerCandidate, Scored};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Normalized problem statement produced by the triage stage
///
/// All five fields are non-empty after the stage completes; the fallback
/// path fills them with best-effort raw text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageRecord {
    pub title: String,
    pub impact: String,
    pub reproducibility: String,
    pub environment: String,
    pub notes: String,
}

/// What the user already tried, as an ordered list of short strings
///
/// The list may be empty but is never absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AttemptsRecord {
    pub items: Vec<String>,
}

/// Urgency of a clarifying question; drives ask order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Rank for ask ordering: high=0 < medium=1 < low=2
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

/// A generated clarifying question with metadata about why it matters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Unique within the generated batch
    pub id: String,
    pub question: String,
    pub expected_type: String,
    pub why_it_matters: String,
    pub required: bool,
    pub priority: Priority,
}

/// The user's answer to one line item, recorded in ask order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemAnswer {
    /// Matches the id of the asked LineItem
    pub id: String,
    pub answer: String,
}

/// Best historical match plus ranked alternatives
///
/// The matched candidate is stored as an index into the candidate list,
/// so the membership invariant holds by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    candidates: Vec<Scored<BlockerCandidate>>,
    matched_index: Option<usize>,
}

impl MatchResult {
    /// Build a result, dropping an out-of-bounds match index
    pub fn new(candidates: Vec<Scored<BlockerCandidate>>, matched_index: Option<usize>) -> Self {
        let matched_index = match matched_index {
            Some(i) if i < candidates.len() => Some(i),
            Some(i) => {
                debug!(index = i, count = candidates.len(), "MatchResult::new: index out of bounds, dropping");
                None
            }
            None => None,
        };
        Self {
            candidates,
            matched_index,
        }
    }

    /// Result with no candidates and no match
    pub fn empty() -> Self {
        Self {
            candidates: Vec::new(),
            matched_index: None,
        }
    }

    /// The matched candidate, if any
    pub fn matched(&self) -> Option<&Scored<BlockerCandidate>> {
        self.matched_index.map(|i| &self.candidates[i])
    }

    /// The ranked candidate list
    pub fn candidates(&self) -> &[Scored<BlockerCandidate>] {
        &self.candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str) -> Scored<BlockerCandidate> {
        Scored {
            item: BlockerCandidate {
                id: id.to_string(),
                title: format!("Blocker {id}"),
                summary: String::new(),
                resolution: None,
                tags: vec![],
            },
            score: 0.5,
        }
    }

    #[test]
    fn test_priority_rank_order() {
        assert!(Priority::High.rank() < Priority::Medium.rank());
        assert!(Priority::Medium.rank() < Priority::Low.rank());
    }

    #[test]
    fn test_priority_deserializes_lowercase() {
        assert_eq!(serde_json::from_str::<Priority>("\"high\"").unwrap(), Priority::High);
        assert_eq!(serde_json::from_str::<Priority>("\"medium\"").unwrap(), Priority::Medium);
        assert!(serde_json::from_str::<Priority>("\"urgent\"").is_err());
    }

    #[test]
    fn test_line_item_deserialize() {
        let json = r#"{
            "id": "li_01",
            "question": "Is the widget behind a feature flag?",
            "expected_type": "yes_no_or_name",
            "why_it_matters": "Flags commonly hide UI in non-prod",
            "required": true,
            "priority": "high"
        }"#;

        let item: LineItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, "li_01");
        assert_eq!(item.priority, Priority::High);
        assert!(item.required);
    }

    #[test]
    fn test_match_result_membership() {
        let result = MatchResult::new(vec![candidate("b-1"), candidate("b-2")], Some(1));
        let matched = result.matched().unwrap();
        assert!(result.candidates().iter().any(|c| c.item.id == matched.item.id));
        assert_eq!(matched.item.id, "b-2");
    }

    #[test]
    fn test_match_result_out_of_bounds_dropped() {
        let result = MatchResult::new(vec![candidate("b-1")], Some(5));
        assert!(result.matched().is_none());
        assert_eq!(result.candidates().len(), 1);
    }

    #[test]
    fn test_match_result_empty() {
        let result = MatchResult::empty();
        assert!(result.matched().is_none());
        assert!(result.candidates().is_empty());
    }
}
