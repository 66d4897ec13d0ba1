//! Ask command handler.
//!
//! One-shot question/answer cycle: connect, retrieve, compose, print.

use clap::Args;
use colored::Colorize;
use noctua_chat::ChatSession;
use noctua_core::{AppResult, Settings};

/// Ask a single question and print the cited answer
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Result-count limit sent to the retrieval service
    #[arg(long)]
    pub top: Option<u32>,

    /// Minimum reranker score a passage must reach
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Output as JSON (answer, citations, passage count)
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, settings: &Settings) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let mut settings = settings.clone();
        if let Some(top) = self.top {
            settings.retrieval_top = top;
        }
        if let Some(threshold) = self.threshold {
            settings.reranker_threshold = threshold;
        }

        let mut session = ChatSession::new(settings);
        session.connect().await?;

        let outcome = session.ask(&self.question).await?;

        if self.json {
            let output = serde_json::json!({
                "question": self.question,
                "answer": outcome.answer,
                "passagesUsed": outcome.passages.len(),
                "citations": outcome.citations.iter().map(|c| {
                    serde_json::json!({ "sourceId": c.source_id, "resolved": c.resolved })
                }).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", outcome.answer);

            if !outcome.citations.is_empty() {
                println!();
                println!("{}", "Sources:".bold());
                for citation in &outcome.citations {
                    if citation.resolved {
                        println!("  [{}]", citation.source_id.cyan());
                    } else {
                        println!("  [{}] {}", citation.source_id, "(not in retrieved set)".dimmed());
                    }
                }
            }
        }

        Ok(())
    }
}
