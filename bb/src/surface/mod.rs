//! Dialogue surfaces - how the pipeline talks to the developer
//!
//! A surface exposes three operations: `ask` a question and get text
//! back, `confirm` a yes/no, and `say` something. The console surface
//! drives a live terminal conversation; the scripted surface replays a
//! fixed answer sequence for demo mode and deterministic tests.

use async_trait::async_trait;
use eyre::Result;

mod console;
mod scripted;

pub use console::ConsoleSurface;
pub use scripted::ScriptedSurface;

/// Console/voice input-output capability for dialogue stages
#[async_trait]
pub trait DialogueSurface: Send {
    /// Ask a question and return the user's raw answer
    async fn ask(&mut self, prompt: &str) -> Result<String>;

    /// Report something to the user
    async fn say(&mut self, text: &str) -> Result<()>;

    /// Ask a yes/no question
    ///
    /// Any answer beginning with "y" (case-insensitive) is true.
    async fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let answer = self.ask(prompt).await?;
        Ok(answer_is_yes(&answer))
    }
}

/// Interpret a raw answer as an affirmative
pub fn answer_is_yes(answer: &str) -> bool {
    answer.trim().to_lowercase().starts_with('y')
}
