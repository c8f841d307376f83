//! Structured records passed between pipeline stages
//!
//! Records are immutable once built: each stage reads its priors by
//! reference and returns a newly constructed record, never mutating
//! inputs in place.

mod context;
mod records;

pub use context::RetrievalContext;
pub use records::{AttemptsRecord, LineItem, LineItemAnswer, MatchResult, Priority, TriageRecord};
