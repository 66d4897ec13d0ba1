//! Command handlers for the Noctua CLI.

mod ask;
mod chat;
mod status;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use status::StatusCommand;
