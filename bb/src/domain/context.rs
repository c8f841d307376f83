//! Background-fetched supporting material

use std::collections::BTreeMap;

use blockerstore::{BlockerCandidate, Scored, Ticket};
use serde::{Deserialize, Serialize};

/// Supporting material gathered by the background retrieval stage
///
/// Populated atomically: the retrieval stage joins all three fetches
/// before returning, so consumers never observe a half-filled context.
/// A failed fetch degrades to an empty collection rather than aborting
/// the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalContext {
    pub tickets: Vec<Scored<Ticket>>,
    pub blocker_candidates: Vec<Scored<BlockerCandidate>>,
    pub glossary: BTreeMap<String, String>,
}

impl RetrievalContext {
    /// True when every collection came back empty
    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty() && self.blocker_candidates.is_empty() && self.glossary.is_empty()
    }
}
