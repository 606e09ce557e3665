//! Wayfarer - concurrent multi-source trip planner
//!
//! CLI entry point for one-shot requests and interactive sessions.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use eyre::{Context, Result};
use tracing::{debug, info};

use wayfarer::cli::{Cli, Command};
use wayfarer::config::Config;
use wayfarer::domain::generate_session_id;
use wayfarer::{CancellationToken, KeywordClassifier, Orchestrator, Synthesizer, TextSynthesizer, registry_from_config, repl};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wayfarer")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("wayfarer.log")).context("Failed to create log file")?;

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

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(fixtures) = cli.fixtures {
        debug!(path = %fixtures.display(), "main: fixtures overridden from CLI");
        config.providers.fixtures = Some(fixtures);
    }

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Ask { text, session }) => {
            debug!("main: matched Ask command");
            cmd_ask(&config, &text, session).await
        }
        Some(Command::Chat { session }) => {
            debug!("main: matched Chat command");
            let orchestrator = build_orchestrator(&config)?;
            repl::run_interactive(Arc::new(orchestrator), session).await
        }
        Some(Command::Config) => {
            debug!("main: matched Config command");
            let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
            print!("{}", yaml);
            Ok(())
        }
        None => {
            debug!("main: no command, printing help");
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let registry = registry_from_config(config).context("Failed to set up providers")?;
    let classifier = KeywordClassifier::new().context("Failed to build intent classifier")?;
    Ok(Orchestrator::from_config(config, Arc::new(classifier), registry))
}

async fn cmd_ask(config: &Config, text: &str, session: Option<String>) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;
    let synthesizer = TextSynthesizer::new()?;
    let session_id = session.unwrap_or_else(generate_session_id);
    info!(%session_id, "cmd_ask: handling request");

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let result = orchestrator.handle(&session_id, text, &cancel).await;
    watcher.abort();

    let outcome = result?;
    println!("{}", synthesizer.synthesize(&outcome)?);
    Ok(())
}
