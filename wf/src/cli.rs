//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Wayfarer - concurrent multi-source trip planner
#[derive(Parser)]
#[command(
    name = "wf",
    about = "Plan trips from several travel data sources at once",
    version = env!("CARGO_PKG_VERSION"),
    after_help = "Logs are written to: ~/.local/share/wayfarer/logs/wayfarer.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Serve provider data from a fixtures file instead of SerpApi
    #[arg(long, global = true, value_name = "FILE")]
    pub fixtures: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Answer a single request
    Ask {
        /// The request, e.g. "plan a 3 day trip to Rome for food lovers"
        text: String,

        /// Session id; requests sharing one can modify each other's plans
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Start an interactive planning session
    Chat {
        /// Session id to use (a new one is generated otherwise)
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Print the effective configuration as YAML
    Config,
}
