//! Logging bootstrap.
//!
//! Structured logs go to stderr so stdout stays clean for answers and JSON
//! output. Filtering follows `RUST_LOG` unless a level override is given.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{AppError, AppResult};

/// Initialize the tracing subscriber.
///
/// # Arguments
/// * `log_level` - Optional filter override (e.g., "debug", "noctua=trace")
/// * `no_color` - Disable ANSI colors
pub fn init_logging(log_level: Option<&str>, no_color: bool) -> AppResult<()> {
    let default_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = log_level.unwrap_or(&default_filter);

    let env_filter = EnvFilter::try_new(filter)
        .map_err(|e| AppError::Config(format!("Invalid log filter '{}': {}", filter, e)))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(!no_color && std::env::var("NO_COLOR").is_err());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| AppError::Config(format!("Failed to init logging: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_rejected() {
        let result = init_logging(Some("not a [valid] filter=="), true);
        assert!(result.is_err());
    }
}
