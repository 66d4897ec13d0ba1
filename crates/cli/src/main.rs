//! Noctua CLI
//!
//! Main entry point for the noctua command-line tool: a retrieval-augmented
//! chat assistant for the Earth at Night document collection, backed by a
//! hosted knowledge agent and a hosted chat-completion deployment.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, StatusCommand};
use noctua_core::{logging, AppResult, Settings};

/// Noctua - retrieval-augmented chat over hosted search and generation
#[derive(Parser, Debug)]
#[command(name = "noctua")]
#[command(about = "Chat with the Earth at Night document collection", long_about = None)]
#[command(version)]
struct Cli {
    /// Retrieval service endpoint override
    #[arg(long, global = true, env = "NOCTUA_SEARCH_ENDPOINT")]
    search_endpoint: Option<String>,

    /// Generation service endpoint override
    #[arg(long, global = true, env = "NOCTUA_OPENAI_ENDPOINT")]
    openai_endpoint: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive chat session
    Chat(ChatCommand),

    /// Ask a single question and print the cited answer
    Ask(AskCommand),

    /// Show resolved settings and connection status
    Status(StatusCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    // Endpoint flags overlay the environment before required-key
    // validation, so `--search-endpoint` works even when the variable is
    // unset. Required-key faults then still name every missing key.
    let mut env: std::collections::HashMap<String, String> = std::env::vars().collect();
    if let Some(ref endpoint) = cli.search_endpoint {
        env.insert(noctua_core::config::KEY_SEARCH_ENDPOINT.to_string(), endpoint.clone());
    }
    if let Some(ref endpoint) = cli.openai_endpoint {
        env.insert(noctua_core::config::KEY_OPENAI_ENDPOINT.to_string(), endpoint.clone());
    }

    let settings = Settings::from_sources(&env)?.with_overrides(
        None,
        None,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(settings.log_level.as_deref(), settings.no_color)?;

    tracing::info!("Noctua starting");
    tracing::debug!("Search endpoint: {}", settings.search_endpoint);
    tracing::debug!("Generation endpoint: {}", settings.openai_endpoint);

    let command_name = match &cli.command {
        Commands::Chat(_) => "chat",
        Commands::Ask(_) => "ask",
        Commands::Status(_) => "status",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Chat(cmd) => cmd.execute(&settings).await,
        Commands::Ask(cmd) => cmd.execute(&settings).await,
        Commands::Status(cmd) => cmd.execute(&settings).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
