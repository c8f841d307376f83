//! BlockerBot - Agentic Standup Blocker Assistant
//!
//! CLI entry point for interactive and demo sessions.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use blockerbot::cli::Cli;
use blockerbot::config::Config;
use blockerbot::llm::{LlmClient, OpenAiClient};
use blockerbot::pipeline::PipelineCoordinator;
use blockerbot::surface::{ConsoleSurface, DialogueSurface, ScriptedSurface};
use blockerstore::{Datasets, Embedder, RetrievalStore};

fn setup_logging(verbose: bool) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("blockerbot")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let log_file = fs::File::create(log_dir.join("blockerbot.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(data_dir) = cli.data_dir {
        debug!(?data_dir, "main: overriding data directory from CLI");
        config.retrieval.data_dir = Some(data_dir);
    }

    info!("BlockerBot loaded config: model={}", config.llm.model);

    if cli.demo {
        debug!("main: running demo session");
        run_demo(&config).await
    } else {
        debug!("main: running interactive session");
        run_interactive(&config).await
    }
}

/// Build the LLM client, retrieval store, and coordinator
async fn build_coordinator(config: &Config) -> Result<PipelineCoordinator> {
    debug!("build_coordinator: called");

    let client = Arc::new(OpenAiClient::from_config(&config.llm).context("Failed to create LLM client")?);
    let llm: Arc<dyn LlmClient> = client.clone();
    let embedder: Arc<dyn Embedder> = client;

    let datasets = match &config.retrieval.data_dir {
        Some(dir) => Datasets::load_dir(dir).context(format!("Failed to load datasets from {}", dir.display()))?,
        None => {
            debug!("build_coordinator: no data directory configured, using sample datasets");
            Datasets::sample()
        }
    };

    let store = Arc::new(
        RetrievalStore::build(datasets, embedder)
            .await
            .context("Failed to build retrieval store")?,
    );

    Ok(PipelineCoordinator::new(llm, store, config))
}

/// Run one scripted session with canned answers
///
/// Demo mode skips config validation so it works without an API key;
/// model calls degrade to fallbacks and embeddings go offline.
async fn run_demo(config: &Config) -> Result<()> {
    debug!("run_demo: called");
    if config.llm.get_api_key().is_err() {
        warn!("run_demo: no API key set; session will use retries and fallback embeddings");
        println!(
            "{}",
            "Note: no API key set, running fully offline with deterministic fallbacks.".yellow()
        );
    }

    let coordinator = build_coordinator(config).await?;
    let mut surface = ScriptedSurface::demo();

    let records = coordinator.run_session(&mut surface).await?;
    info!(session_id = %records.session_id, "Demo session finished");

    println!();
    println!("{}", "Demo session complete.".bright_green());
    Ok(())
}

/// Run interactive sessions until the user is done
async fn run_interactive(config: &Config) -> Result<()> {
    debug!("run_interactive: called");
    config.validate()?;

    let coordinator = build_coordinator(config).await?;
    let mut surface = ConsoleSurface::new()?;

    println!("{}", "BlockerBot - let's get you unblocked.".bright_cyan().bold());

    loop {
        match coordinator.run_session(&mut surface).await {
            Ok(records) => {
                info!(session_id = %records.session_id, "Session finished");
            }
            Err(e) => {
                warn!(error = %e, "Session ended with an error");
                println!();
                println!("{} {}", "Session ended:".yellow(), e);
            }
        }

        if !surface.confirm("Log another blocker?").await? {
            debug!("run_interactive: user declined another session");
            break;
        }
    }

    println!();
    println!("{}", "Good luck out there.".bright_green());
    Ok(())
}
