//! Command-line interface definitions

use std::path::PathBuf;

use clap::Parser;

/// BlockerBot - agentic standup blocker assistant
#[derive(Debug, Parser)]
#[command(name = "bb", version, about = "Walk through a standup blocker and get matched with history and help")]
pub struct Cli {
    /// Path to config file (default: .blockerbot.yml, then user config)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Run a scripted demo session (no interactive input, no API key needed)
    #[arg(long)]
    pub demo: bool,

    /// Override the dataset directory from config
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}
