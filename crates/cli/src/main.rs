//! docchat CLI
//!
//! Main entry point for the docchat command-line tool: chat with a
//! document using a locally hosted language model.

mod commands;
mod context;

use clap::{Parser, Subcommand};
use commands::{
    AskCommand, ChatCommand, DeleteCommand, IngestCommand, ModelsCommand, StatusCommand,
};
use docchat_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// docchat - ask questions answered strictly from your document
#[derive(Parser, Debug)]
#[command(name = "docchat")]
#[command(about = "Chat with a document using a locally hosted LLM", long_about = None)]
#[command(version)]
struct Cli {
    /// Data directory (default: ./.docchat)
    #[arg(short, long, global = true, env = "DOCCHAT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "DOCCHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Provider for embeddings ("ollama", "mock")
    #[arg(short, long, global = true, env = "DOCCHAT_PROVIDER")]
    provider: Option<String>,

    /// Chat model identifier
    #[arg(short, long, global = true, env = "DOCCHAT_MODEL")]
    model: Option<String>,

    /// Provider endpoint URL
    #[arg(short, long, global = true, env = "DOCCHAT_ENDPOINT")]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest a document (txt, md, html) into the session
    Ingest(IngestCommand),

    /// Ask one question against the ingested document
    Ask(AskCommand),

    /// Interactive chat against the ingested document
    Chat(ChatCommand),

    /// Delete the session's collection
    Delete(DeleteCommand),

    /// List models installed on the provider
    Models(ModelsCommand),

    /// Show session and collection status
    Status(StatusCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment and config file
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.data_dir,
        cli.config,
        cli.provider,
        cli.model,
        cli.endpoint,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("docchat starting");
    tracing::debug!("Data dir: {:?}", config.data_dir);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    let command_name = match &cli.command {
        Commands::Ingest(_) => "ingest",
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
        Commands::Delete(_) => "delete",
        Commands::Models(_) => "models",
        Commands::Status(_) => "status",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let ctx = context::AppContext::build(config)?;

    let result = match cli.command {
        Commands::Ingest(cmd) => cmd.execute(&ctx).await,
        Commands::Ask(cmd) => cmd.execute(&ctx).await,
        Commands::Chat(cmd) => cmd.execute(&ctx).await,
        Commands::Delete(cmd) => cmd.execute(&ctx).await,
        Commands::Models(cmd) => cmd.execute(&ctx).await,
        Commands::Status(cmd) => cmd.execute(&ctx).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
