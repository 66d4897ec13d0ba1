//! Error types for the Noctua chat assistant.
//!
//! This module defines a unified error enum covering all failure domains:
//! configuration, authentication, retrieval, generation, I/O, and
//! serialization.

use thiserror::Error;

/// Unified error type for the Noctua chat assistant.
///
/// All functions in the application return `Result<T, AppError>`.
/// We never panic; errors must be represented and propagated.
///
/// Initialization errors (`MissingConfig`, `Auth`) halt interaction until
/// the user fixes the environment and reconnects. Per-question errors
/// (`Retrieval`, `Generation`) are reported at the cycle boundary and the
/// conversation continues.
#[derive(Error, Debug)]
pub enum AppError {
    /// One or more required settings are absent. Lists every missing key so
    /// the user can fix all of them in one pass.
    #[error("Missing required configuration: {}", .0.join(", "))]
    MissingConfig(Vec<String>),

    /// Configuration present but unusable (bad value, unreadable file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential resolution or service handshake failure
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Retrieval service transport or response fault
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Generation service transport fault or empty response
    #[error("Generation error: {0}")]
    Generation(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl AppError {
    /// Whether this error ends the session (as opposed to one answer cycle).
    ///
    /// Fatal errors require re-initialization; cycle errors are reported
    /// and the next question is accepted.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::MissingConfig(_) | AppError::Auth(_))
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
