//! Status command handler.
//!
//! Prints resolved settings (secrets redacted), the credential mode, and
//! which optional features are configured. `--probe` additionally checks
//! that both services accept the credential.

use clap::Args;
use colored::Colorize;
use noctua_chat::ChatSession;
use noctua_core::{AppResult, Settings};

/// Show resolved settings and connection status
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// Probe both services with the selected credential
    #[arg(long)]
    pub probe: bool,
}

impl StatusCommand {
    /// Execute the status command.
    pub async fn execute(&self, settings: &Settings) -> AppResult<()> {
        let session = ChatSession::new(settings.clone());

        println!("{}", "Noctua configuration".bold());
        println!("  Search endpoint:      {}", settings.search_endpoint);
        println!("  Search agent:         {}", settings.search_agent);
        println!("  Search index:         {}", settings.search_index);
        println!("  Generation endpoint:  {}", settings.openai_endpoint);
        println!("  GPT deployment:       {}", settings.gpt_deployment);
        if let Some(ref embedding) = settings.embedding_deployment {
            println!("  Embedding deployment: {}", embedding);
        }
        println!("  Retrieval top:        {}", settings.retrieval_top);
        println!("  Reranker threshold:   {:.1}", settings.reranker_threshold);
        println!("  Credential mode:      {}", session.credential_mode());
        if settings.api_key.is_some() {
            println!("  API key:              {}", "(configured, redacted)".dimmed());
        }

        println!();
        println!("{}", "Optional features".bold());
        println!(
            "  Document ingestion:   {}",
            enabled_label(settings.storage_enabled())
        );
        println!(
            "  Analytics:            {}",
            enabled_label(settings.analytics_enabled())
        );

        if self.probe {
            println!();
            let mut session = session;
            match session.connect().await {
                Ok(()) => println!("Connection: {}", "connected".green()),
                Err(e) => {
                    println!("Connection: {}", "error".red());
                    println!("  {}", e);
                    return Err(e);
                }
            }
        }

        Ok(())
    }
}

fn enabled_label(enabled: bool) -> String {
    if enabled {
        "enabled".green().to_string()
    } else {
        "not configured".dimmed().to_string()
    }
}
