//! Background retrieval stage
//!
//! Launched immediately after triage completes and runs while the
//! attempts dialogue is in progress. Issues three retrieval calls
//! concurrently and joins on all of them, so the returned context is
//! always fully populated. Any failed leg degrades to an empty
//! collection; retrieval never aborts the session.

use std::sync::Arc;

use blockerstore::RetrievalStore;
use tracing::{debug, info, warn};

use crate::config::RetrievalConfig;
use crate::domain::{RetrievalContext, TriageRecord};

/// Background stage producing the RetrievalContext
pub struct RetrievalStage {
    store: Arc<RetrievalStore>,
    config: RetrievalConfig,
}

impl RetrievalStage {
    pub fn new(store: Arc<RetrievalStore>, config: RetrievalConfig) -> Self {
        Self { store, config }
    }

    /// Composite query string derived from the triage record
    pub fn query_for(triage: &TriageRecord) -> String {
        format!(
            "{} {} {} {}",
            triage.title, triage.environment, triage.notes, triage.reproducibility
        )
    }

    /// Fetch tickets, blocker candidates, and glossary definitions
    pub async fn run(&self, triage: &TriageRecord) -> RetrievalContext {
        debug!("RetrievalStage::run: called");
        let query = Self::query_for(triage);

        let (tickets, blockers, glossary) = tokio::join!(
            self.store.search_tickets(&query, self.config.ticket_top_k),
            self.store.search_blockers(&query, self.config.blocker_top_k),
            async { self.store.glossary_defs(&self.config.glossary_terms) },
        );

        let context = RetrievalContext {
            tickets: tickets.unwrap_or_else(|e| {
                warn!(error = %e, "RetrievalStage: ticket search failed, degrading to empty");
                Vec::new()
            }),
            blocker_candidates: blockers.unwrap_or_else(|e| {
                warn!(error = %e, "RetrievalStage: blocker search failed, degrading to empty");
                Vec::new()
            }),
            glossary,
        };

        info!(
            tickets = context.tickets.len(),
            blockers = context.blocker_candidates.len(),
            glossary = context.glossary.len(),
            "Background retrieval complete"
        );
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use blockerstore::{Datasets, Embedder, EmbedderError};
    use crate::llm::fallback_embedding;

    struct OfflineEmbedder;

    #[async_trait]
    impl Embedder for OfflineEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
            Ok(fallback_embedding(text, 64))
        }
    }

    fn triage() -> TriageRecord {
        TriageRecord {
            title: "Sentiment widget blank".to_string(),
            impact: "demo at risk".to_string(),
            reproducibility: "100%".to_string(),
            environment: "staging".to_string(),
            notes: "empty payload from ml-service".to_string(),
        }
    }

    #[test]
    fn test_query_includes_all_parts() {
        let query = RetrievalStage::query_for(&triage());
        assert!(query.contains("Sentiment widget blank"));
        assert!(query.contains("staging"));
        assert!(query.contains("ml-service"));
        assert!(query.contains("100%"));
    }

    #[tokio::test]
    async fn test_run_populates_all_collections() {
        let store = Arc::new(
            RetrievalStore::build(Datasets::sample(), Arc::new(OfflineEmbedder))
                .await
                .unwrap(),
        );
        let stage = RetrievalStage::new(store, RetrievalConfig::default());

        let context = stage.run(&triage()).await;
        assert!(!context.tickets.is_empty());
        assert!(!context.blocker_candidates.is_empty());
        assert!(context.glossary.contains_key("ml-service"));
    }

    #[tokio::test]
    async fn test_empty_store_degrades_to_empty_context() {
        let store = Arc::new(
            RetrievalStore::build(Datasets::default(), Arc::new(OfflineEmbedder))
                .await
                .unwrap(),
        );
        let stage = RetrievalStage::new(store, RetrievalConfig::default());

        let context = stage.run(&triage()).await;
        assert!(context.tickets.is_empty());
        assert!(context.blocker_candidates.is_empty());
        assert!(context.glossary.is_empty());
    }
}
