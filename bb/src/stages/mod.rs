//! Pipeline stages
//!
//! Each stage consumes prior records plus injected capabilities and
//! produces the next record. Stages come in two shapes:
//!
//! - **Dialogue stages** take the dialogue surface and may call the LLM
//!   to normalize answers (triage, attempts, interview, summarize,
//!   suggestions)
//! - **Background stages** never touch the surface; they only call the
//!   retrieval store and/or the LLM, and are safe to run concurrently
//!   with a dialogue stage (retrieval, final match)
//!
//! Every stage that requests structured output follows parse-or-fallback:
//! locate the first balanced JSON value in the response, validate the
//! shape, and on any failure synthesize a deterministic fallback record
//! from the raw inputs. Stages are total - they always return a record.

mod attempts;
mod final_match;
mod interview;
mod line_items;
mod retrieval;
mod suggest;
mod summarize;
mod triage;

pub use attempts::AttemptsStage;
pub use final_match::FinalMatchStage;
pub use interview::InterviewStage;
pub use line_items::LineItemStage;
pub use retrieval::RetrievalStage;
pub use suggest::{SuggestPersonStage, SuggestStepsStage};
pub use summarize::SummarizeStage;
pub use triage::TriageStage;
