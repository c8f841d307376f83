//! RetrievalStore - similarity search and teammate ranking
//!
//! The store embeds every blocker and ticket once at construction and
//! keeps the vectors in an in-process cache keyed by candidate id. All
//! query operations are pure reads, so the store can be shared behind an
//! `Arc` and queried concurrently with dialogue.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::embed::{Embedder, cosine_similarity};
use crate::types::{BlockerCandidate, Datasets, Scored, TeamMember, Ticket};

/// Additive score bonus when a ticket tag literally appears in the query
const TAG_BONUS: f32 = 0.05;

/// Errors from store construction and queries
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("embedding failed for '{id}': {message}")]
    Embedding { id: String, message: String },
}

/// Read-only retrieval store with a precomputed embedding cache
pub struct RetrievalStore {
    embedder: Arc<dyn Embedder>,
    blockers: Vec<BlockerCandidate>,
    tickets: Vec<Ticket>,
    team: Vec<TeamMember>,
    glossary: BTreeMap<String, String>,
    // Built once in `build`, read-only afterwards
    blocker_vectors: HashMap<String, Vec<f32>>,
    ticket_vectors: HashMap<String, Vec<f32>>,
}

impl RetrievalStore {
    /// Build a store, embedding every blocker and ticket up front
    pub async fn build(datasets: Datasets, embedder: Arc<dyn Embedder>) -> Result<Self, StoreError> {
        debug!(
            blockers = datasets.blockers.len(),
            tickets = datasets.tickets.len(),
            "RetrievalStore::build: called"
        );

        let mut blocker_vectors = HashMap::new();
        for blocker in &datasets.blockers {
            let vector = embedder
                .embed(&blocker.embed_text())
                .await
                .map_err(|e| StoreError::Embedding {
                    id: blocker.id.clone(),
                    message: e.to_string(),
                })?;
            blocker_vectors.insert(blocker.id.clone(), vector);
        }

        let mut ticket_vectors = HashMap::new();
        for ticket in &datasets.tickets {
            let vector = embedder
                .embed(&ticket.embed_text())
                .await
                .map_err(|e| StoreError::Embedding {
                    id: ticket.id.clone(),
                    message: e.to_string(),
                })?;
            ticket_vectors.insert(ticket.id.clone(), vector);
        }

        info!(
            blockers = blocker_vectors.len(),
            tickets = ticket_vectors.len(),
            team = datasets.team.len(),
            "Retrieval store ready"
        );

        Ok(Self {
            embedder,
            blockers: datasets.blockers,
            tickets: datasets.tickets,
            team: datasets.team,
            glossary: datasets.glossary,
            blocker_vectors,
            ticket_vectors,
        })
    }

    /// Search historical blockers by cosine similarity, descending
    pub async fn search_blockers(&self, query: &str, top_k: usize) -> Result<Vec<Scored<BlockerCandidate>>, StoreError> {
        debug!(%query, top_k, "search_blockers: called");
        let query_vector = self.embed_query(query).await?;

        let mut hits: Vec<Scored<BlockerCandidate>> = self
            .blockers
            .iter()
            .map(|blocker| {
                let vector = self.blocker_vectors.get(&blocker.id);
                let score = vector.map(|v| cosine_similarity(&query_vector, v)).unwrap_or(0.0);
                Scored {
                    item: blocker.clone(),
                    score,
                }
            })
            .collect();

        sort_descending(&mut hits);
        hits.truncate(top_k);
        Ok(hits)
    }

    /// Search tickets by cosine similarity with a literal-tag bonus
    ///
    /// A small additive bonus is applied when one of the ticket's tags
    /// appears verbatim (case-insensitive) in the query string.
    pub async fn search_tickets(&self, query: &str, top_k: usize) -> Result<Vec<Scored<Ticket>>, StoreError> {
        debug!(%query, top_k, "search_tickets: called");
        let query_vector = self.embed_query(query).await?;
        let query_lower = query.to_lowercase();

        let mut hits: Vec<Scored<Ticket>> = self
            .tickets
            .iter()
            .map(|ticket| {
                let vector = self.ticket_vectors.get(&ticket.id);
                let mut score = vector.map(|v| cosine_similarity(&query_vector, v)).unwrap_or(0.0);
                if ticket.tags.iter().any(|tag| query_lower.contains(&tag.to_lowercase())) {
                    debug!(id = %ticket.id, "search_tickets: tag bonus applied");
                    score += TAG_BONUS;
                }
                Scored {
                    item: ticket.clone(),
                    score,
                }
            })
            .collect();

        sort_descending(&mut hits);
        hits.truncate(top_k);
        Ok(hits)
    }

    /// Look up glossary definitions for the given terms
    ///
    /// Unknown terms are omitted from the result.
    pub fn glossary_defs(&self, terms: &[String]) -> BTreeMap<String, String> {
        debug!(term_count = terms.len(), "glossary_defs: called");
        terms
            .iter()
            .filter_map(|term| self.glossary.get(term).map(|def| (term.clone(), def.clone())))
            .collect()
    }

    /// Rank team members by skill overlap, descending, stable
    ///
    /// Overlap is the count of intersecting skills (case-insensitive).
    /// Members with zero overlap are excluded.
    pub fn find_team_candidates(&self, skills_needed: &[String]) -> Vec<Scored<TeamMember>> {
        debug!(skill_count = skills_needed.len(), "find_team_candidates: called");
        let needed: Vec<String> = skills_needed.iter().map(|s| s.trim().to_lowercase()).collect();

        let mut ranked: Vec<Scored<TeamMember>> = self
            .team
            .iter()
            .filter_map(|member| {
                let overlap = member
                    .skills
                    .iter()
                    .filter(|skill| needed.contains(&skill.trim().to_lowercase()))
                    .count();
                if overlap == 0 {
                    return None;
                }
                Some(Scored {
                    item: member.clone(),
                    score: overlap as f32,
                })
            })
            .collect();

        sort_descending(&mut ranked);
        ranked
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, StoreError> {
        self.embedder.embed(query).await.map_err(|e| StoreError::Embedding {
            id: "query".to_string(),
            message: e.to_string(),
        })
    }
}

/// Stable descending sort by score (ties keep dataset order)
fn sort_descending<T>(hits: &mut [Scored<T>]) {
    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
}
