//! Interactive chat command handler.
//!
//! A rustyline-driven loop around a single `ChatSession`. Questions run
//! one retrieval + generation cycle each; slash commands manage the
//! session. Per-cycle errors are printed and the loop continues; only
//! quitting or EOF ends the session.

use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use noctua_chat::{AskOutcome, ChatSession, SessionState};
use noctua_core::{AppError, AppResult, Settings};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::time::Duration;

/// Canned questions shown by `/samples`, taken from the document
/// collection's demo set.
const SAMPLE_QUESTIONS: &[&str] = &[
    "What is bioluminescence and how does it help marine life?",
    "How does night imagery support disaster response?",
    "What causes the urban heat island effect?",
    "How do city lights reveal urban development patterns?",
    "What can satellite imagery tell us about North vs South Korea?",
];

/// Interactive chat session
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Skip the connection attempt at startup (connect later with /reconnect)
    #[arg(long)]
    pub no_connect: bool,
}

impl ChatCommand {
    /// Execute the chat command.
    pub async fn execute(&self, settings: &Settings) -> AppResult<()> {
        let mut session = ChatSession::new(settings.clone());

        print_banner(&session);

        if !self.no_connect {
            connect_with_spinner(&mut session).await;
        }

        let mut editor = DefaultEditor::new()
            .map_err(|e| AppError::Other(format!("Failed to start line editor: {}", e)))?;

        loop {
            let line = match editor.readline("you> ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    println!("{}", "Goodbye.".dimmed());
                    break;
                }
                Err(e) => {
                    return Err(AppError::Other(format!("Input error: {}", e)));
                }
            };

            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            let _ = editor.add_history_entry(input);

            if let Some(command) = input.strip_prefix('/') {
                if !handle_command(command, &mut session).await {
                    break;
                }
                continue;
            }

            run_cycle(&mut session, input).await;
        }

        Ok(())
    }
}

fn print_banner(session: &ChatSession) {
    println!("{}", "Noctua - Earth at Night assistant".bold());
    println!(
        "Agent '{}' on index '{}', deployment '{}'",
        session.settings().search_agent,
        session.settings().search_index,
        session.settings().gpt_deployment
    );
    println!("Type a question, or /help for commands.");
    println!();
}

fn status_line(session: &ChatSession) -> String {
    match session.state() {
        SessionState::Connected => "connected".green().to_string(),
        SessionState::Uninitialized => "not connected".red().to_string(),
    }
}

async fn connect_with_spinner(session: &mut ChatSession) {
    let spinner = start_spinner("Connecting...");
    let result = session.connect().await;
    spinner.finish_and_clear();

    match result {
        Ok(()) => println!("Status: {}", status_line(session)),
        Err(e) => {
            println!("{} {}", "Connection failed:".red(), e);
            println!("Fix the environment and run {}.", "/reconnect".bold());
        }
    }
    println!();
}

/// Handle a slash command. Returns false when the loop should exit.
async fn handle_command(command: &str, session: &mut ChatSession) -> bool {
    match command {
        "help" => {
            println!("Commands:");
            println!("  /clear      forget the conversation so far");
            println!("  /reconnect  re-initialize the service connections");
            println!("  /status     connection status and transcript length");
            println!("  /history    reprint the transcript");
            println!("  /samples    example questions");
            println!("  /quit       exit");
        }
        "clear" => {
            session.clear_history();
            println!("Transcript cleared.");
        }
        "reconnect" => {
            connect_with_spinner(session).await;
        }
        "status" => {
            println!("Status: {}", status_line(session));
            println!("Credential mode: {}", session.credential_mode());
            println!("Transcript: {} turns", session.history().len());
        }
        "history" => {
            if session.history().is_empty() {
                println!("{}", "(empty transcript)".dimmed());
            }
            for turn in session.history() {
                let label = match turn.role {
                    noctua_chat::TurnRole::User => "you".blue(),
                    noctua_chat::TurnRole::Assistant => "noctua".magenta(),
                };
                println!(
                    "{} {} {}",
                    format!("[{}]", turn.timestamp.format("%H:%M:%S")).dimmed(),
                    label,
                    turn.text
                );
            }
        }
        "samples" => {
            for (i, question) in SAMPLE_QUESTIONS.iter().enumerate() {
                println!("  {}. {}", i + 1, question);
            }
        }
        "quit" | "exit" => {
            println!("{}", "Goodbye.".dimmed());
            return false;
        }
        other => {
            println!("Unknown command '/{}'. Try /help.", other);
        }
    }
    true
}

/// Run one question/answer cycle and render the outcome. Errors are
/// reported here and never end the loop.
async fn run_cycle(session: &mut ChatSession, question: &str) {
    if session.state() != SessionState::Connected {
        println!(
            "{} Run {} first.",
            "Not connected.".red(),
            "/reconnect".bold()
        );
        return;
    }

    let spinner = start_spinner("Thinking...");
    let result = session.ask(question).await;
    spinner.finish_and_clear();

    match result {
        Ok(outcome) => render_outcome(&outcome),
        Err(e) if e.is_fatal() => {
            println!("{} {}", "Session error:".red(), e);
            println!("Run {} to re-initialize.", "/reconnect".bold());
        }
        Err(e) => {
            // Cycle error: transcript unchanged, next question welcome.
            println!("{} {}", "Error:".red(), e);
        }
    }
    println!();
}

fn render_outcome(outcome: &AskOutcome) {
    println!("{} {}", "noctua>".magenta().bold(), outcome.answer);

    if outcome.passages.is_empty() {
        println!("{}", "(no passages cleared the relevance threshold)".dimmed());
    }

    if !outcome.citations.is_empty() {
        println!("{}", "sources:".dimmed());
        for citation in &outcome.citations {
            if citation.resolved {
                println!("  [{}]", citation.source_id.cyan());
            } else {
                println!(
                    "  [{}] {}",
                    citation.source_id,
                    "(not in retrieved set)".dimmed()
                );
            }
        }
    }
}

fn start_spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
