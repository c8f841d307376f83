//! BlockerStore - read-only retrieval over historical standup data
//!
//! Provides similarity search over past blockers and tickets, glossary
//! lookups, and skill-based teammate ranking. The store embeds every
//! candidate once at construction time and is read-only afterwards; the
//! embedding provider is injected behind the [`Embedder`] trait so the
//! store never talks to the network itself.

pub mod embed;
pub mod store;
pub mod types;

pub use embed::{Embedder, EmbedderError, cosine_similarity};
pub use store::{RetrievalStore, StoreError};
pub use types::{BlockerCandidate, Contact, Datasets, Scored, TeamMember, Ticket};
