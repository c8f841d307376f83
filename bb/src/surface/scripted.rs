//! Scripted dialogue surface for demo mode and deterministic tests

use std::collections::VecDeque;

use async_trait::async_trait;
use colored::Colorize;
use eyre::Result;
use tracing::{debug, warn};

use super::DialogueSurface;

/// Surface that replays a fixed sequence of answers
///
/// Every prompt passed to `ask`/`confirm` and every line passed to
/// `say` is recorded, so tests can assert on the full conversation.
/// An exhausted answer queue yields empty answers rather than failing.
pub struct ScriptedSurface {
    answers: VecDeque<String>,
    /// Prompts the pipeline asked, in order
    pub asked: Vec<String>,
    /// Lines the pipeline reported, in order
    pub said: Vec<String>,
    /// Echo the conversation to stdout (demo mode)
    echo: bool,
}

impl ScriptedSurface {
    /// Create a scripted surface from a list of answers
    pub fn new(answers: Vec<&str>) -> Self {
        Self {
            answers: answers.into_iter().map(str::to_string).collect(),
            asked: Vec::new(),
            said: Vec::new(),
            echo: false,
        }
    }

    /// Echo the conversation to stdout as it happens
    pub fn echoing(mut self) -> Self {
        self.echo = true;
        self
    }

    /// Canned answers for the end-to-end demo session
    pub fn demo() -> Self {
        Self::new(vec![
            "Sentiment widget renders blank on the dashboard, demo to the customer is tomorrow",
            "Staging, every time I reload",
            "No console errors, network tab shows an empty payload from the ml service",
            "Restarted the frontend pod, cleared the browser cache, re-ran the widget build",
            "I have not checked the flags yet",
            "Not sure, the last deploy was on Tuesday",
            "yes",
        ])
        .echoing()
    }
}

#[async_trait]
impl DialogueSurface for ScriptedSurface {
    async fn ask(&mut self, prompt: &str) -> Result<String> {
        debug!(prompt_len = prompt.len(), "ScriptedSurface::ask: called");
        self.asked.push(prompt.to_string());

        let answer = match self.answers.pop_front() {
            Some(a) => a,
            None => {
                warn!("ScriptedSurface::ask: answer queue exhausted, returning empty answer");
                String::new()
            }
        };

        if self.echo {
            println!();
            println!("{} {}", "Assistant:".bright_cyan().bold(), prompt);
            println!("{} {}", ">".bright_green(), answer);
        }

        Ok(answer)
    }

    async fn say(&mut self, text: &str) -> Result<()> {
        debug!(text_len = text.len(), "ScriptedSurface::say: called");
        self.said.push(text.to_string());
        if self.echo {
            println!();
            println!("{} {}", "Assistant:".bright_cyan().bold(), text);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ask_replays_in_order() {
        let mut surface = ScriptedSurface::new(vec!["first", "second"]);
        assert_eq!(surface.ask("q1").await.unwrap(), "first");
        assert_eq!(surface.ask("q2").await.unwrap(), "second");
        assert_eq!(surface.asked, vec!["q1", "q2"]);
    }

    #[tokio::test]
    async fn test_exhausted_queue_returns_empty() {
        let mut surface = ScriptedSurface::new(vec![]);
        assert_eq!(surface.ask("q").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_confirm_yes_and_no() {
        let mut surface = ScriptedSurface::new(vec!["Yes please", "nah"]);
        assert!(surface.confirm("ok?").await.unwrap());
        assert!(!surface.confirm("ok?").await.unwrap());
    }

    #[tokio::test]
    async fn test_say_recorded() {
        let mut surface = ScriptedSurface::new(vec![]);
        surface.say("hello").await.unwrap();
        assert_eq!(surface.said, vec!["hello"]);
    }
}
