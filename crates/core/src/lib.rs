//! Noctua Core Library
//!
//! This crate provides the foundational utilities for the Noctua chat
//! assistant:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Settings loaded from the environment
//! - Credential resolution (managed identity / API key)
//! - Shared HTTP client construction with request timeouts

pub mod config;
pub mod credential;
pub mod error;
pub mod http;
pub mod logging;

// Re-export commonly used types
pub use config::Settings;
pub use credential::{AuthHeader, Credential};
pub use error::{AppError, AppResult};
