//! Chat orchestration for the Noctua assistant.
//!
//! Ties the retrieval client and the generation client into one
//! question/answer workflow: retrieve passages, compose a cited prompt,
//! call the deployment, append the transcript. All heavy lifting happens
//! in the hosted services; this crate owns the session lifecycle and the
//! prompt contract.

pub mod citations;
pub mod prompt;
pub mod session;
pub mod types;

pub use citations::{extract_citations, Citation};
pub use prompt::compose_messages;
pub use session::{ChatSession, SessionState};
pub use types::{AskOutcome, ConversationTurn, TurnRole};
