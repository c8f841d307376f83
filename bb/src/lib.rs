//! BlockerBot - Agentic Standup Blocker Assistant
//!
//! BlockerBot walks a developer through a fixed sequence of
//! information-gathering stages (triage, attempts, clarifying questions,
//! summary confirmation, historical match, recommended actions, suggested
//! teammate). Dialogue stages overlap with background retrieval so the
//! user never waits on I/O mid-conversation.
//!
//! # Core Concepts
//!
//! - **Stages Are Total**: every model call follows parse-or-fallback, so
//!   a stage always returns a record and never fails outward
//! - **Records Are Immutable**: each stage reads priors by reference and
//!   returns a newly built record
//! - **Explicit Concurrency**: background work is launched by name and
//!   joined at an explicit barrier before the stage that needs it
//! - **Offline Degradation**: embedding exhaustion falls back to a
//!   deterministic vector; empty retrieval degrades to empty context
//!
//! # Modules
//!
//! - [`llm`] - LLM client trait and OpenAI-compatible implementation
//! - [`stages`] - the pipeline stages and their prompts
//! - [`pipeline`] - the session coordinator and scheduling
//! - [`surface`] - console and scripted dialogue surfaces
//! - [`domain`] - the structured records stages produce and consume
//! - [`parse`] - lenient structured-output parsing
//! - [`config`] - configuration types and loading

pub mod cli;
pub mod config;
pub mod domain;
pub mod llm;
pub mod parse;
pub mod pipeline;
pub mod stages;
pub mod surface;

// Re-export commonly used types
pub use config::{Config, LlmConfig, RetrievalConfig, SessionConfig};
pub use domain::{
    AttemptsRecord, LineItem, LineItemAnswer, MatchResult, Priority, RetrievalContext, TriageRecord,
};
pub use llm::{CompletionRequest, LlmClient, LlmError, Message, OpenAiClient, Role};
pub use parse::{ParseError, extract_first_json, parse_lenient};
pub use pipeline::{PipelineCoordinator, SessionRecords};
pub use surface::{ConsoleSurface, DialogueSurface, ScriptedSurface};
