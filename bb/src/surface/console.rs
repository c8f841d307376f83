//! Live console dialogue surface

use async_trait::async_trait;
use colored::Colorize;
use eyre::{Result, bail};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use super::DialogueSurface;

/// Interactive console surface with line editing
pub struct ConsoleSurface {
    editor: DefaultEditor,
}

impl ConsoleSurface {
    /// Create a console surface with a readline editor
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;
        Ok(Self { editor })
    }

    fn read_answer(&mut self) -> Result<String> {
        let readline = self.editor.readline(&format!("{} ", ">".bright_green()));
        match readline {
            Ok(line) => {
                let _ = self.editor.add_history_entry(line.as_str());
                Ok(line.trim().to_string())
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                bail!("Session interrupted")
            }
            Err(ReadlineError::Eof) => {
                println!();
                bail!("Input closed")
            }
            Err(err) => bail!("Readline error: {}", err),
        }
    }
}

#[async_trait]
impl DialogueSurface for ConsoleSurface {
    async fn ask(&mut self, prompt: &str) -> Result<String> {
        debug!(prompt_len = prompt.len(), "ConsoleSurface::ask: called");
        println!();
        println!("{} {}", "Assistant:".bright_cyan().bold(), prompt);
        self.read_answer()
    }

    async fn say(&mut self, text: &str) -> Result<()> {
        debug!(text_len = text.len(), "ConsoleSurface::say: called");
        println!();
        println!("{} {}", "Assistant:".bright_cyan().bold(), text);
        Ok(())
    }
}
