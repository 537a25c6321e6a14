//! llmgate CLI — the main entry point.
//!
//! Commands:
//! - `serve`      — Start the HTTP gateway
//! - `ask`        — Run one generation in-process
//! - `knowledge`  — Manage stored knowledge entries
//! - `status`     — Show the effective configuration
//! - `doctor`     — Diagnose config, store and backend

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "llmgate",
    about = "llmgate — knowledge-augmented gateway for a local LLM server",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.llmgate/config.toml
    #[arg(short, long, global = true, env = "LLMGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the bind address
        #[arg(long)]
        host: Option<String>,

        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Send one prompt through the pipeline and print the answer
    Ask(commands::ask::AskArgs),

    /// Manage the knowledge base
    Knowledge {
        #[command(subcommand)]
        action: KnowledgeAction,
    },

    /// Show the effective configuration
    Status,

    /// Diagnose system health
    Doctor,
}

#[derive(Subcommand)]
enum KnowledgeAction {
    /// Save a new entry
    Add {
        category: String,
        title: String,
        content: String,
    },

    /// List entries, newest first
    List {
        /// Only entries of this category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Show one entry
    Show { id: i64 },

    /// Delete one entry
    Delete { id: i64 },

    /// List the distinct categories
    Categories,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve { host, port } => commands::serve::run(config_path, host, port).await?,
        Commands::Ask(args) => commands::ask::run(config_path, args).await?,
        Commands::Knowledge { action } => match action {
            KnowledgeAction::Add {
                category,
                title,
                content,
            } => commands::knowledge::add(config_path, category, title, content).await?,
            KnowledgeAction::List { category } => {
                commands::knowledge::list(config_path, category.as_deref()).await?
            }
            KnowledgeAction::Show { id } => commands::knowledge::show(config_path, id).await?,
            KnowledgeAction::Delete { id } => commands::knowledge::delete(config_path, id).await?,
            KnowledgeAction::Categories => commands::knowledge::categories(config_path).await?,
        },
        Commands::Status => commands::status::run(config_path).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
    }

    Ok(())
}
