//! Jarvis CLI, the main entry point.
//!
//! Commands:
//! - `init`    : write a default config file
//! - `serve`   : start the HTTP API
//! - `chat`    : run one question through the chat pipeline
//! - `ingest`  : add a document to the knowledge base
//! - `models`  : list model presets
//! - `stats`   : show knowledge-base and cache counters
//! - `doctor`  : diagnose config, store and backend

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "jarvis",
    about = "Jarvis: chat with your documents through a local LLM",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.jarvis/config.toml
    #[arg(short, long, global = true, env = "JARVIS_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask a single question
    Chat {
        /// The question to send
        #[arg(short, long)]
        message: String,

        /// context_only, general_only or mixed
        #[arg(long, default_value = "mixed")]
        mode: String,

        /// Model preset key
        #[arg(long)]
        model: Option<String>,

        /// Print the full reply as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a document to the knowledge base
    Ingest {
        /// Path to a text or PDF file
        file: PathBuf,

        /// Record the document against this conversation
        #[arg(long)]
        conversation: Option<String>,
    },

    /// List model presets
    Models,

    /// Show knowledge-base and cache counters
    Stats,

    /// Diagnose system health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli.config;
    match cli.command {
        Commands::Init { force } => commands::init::run(config_path, force)?,
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
        Commands::Chat {
            message,
            mode,
            model,
            json,
        } => commands::chat::run(config_path, message, &mode, model, json).await?,
        Commands::Ingest { file, conversation } => {
            commands::ingest::run(config_path, &file, conversation).await?
        }
        Commands::Models => commands::models::run(config_path)?,
        Commands::Stats => commands::stats::run(config_path).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
    }

    Ok(())
}
