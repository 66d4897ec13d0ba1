//! Chat client factory.

use crate::client::ChatClient;
use crate::providers::DeploymentChatClient;
use std::sync::Arc;

/// Create a chat client for `deployment` at `endpoint`.
///
/// Only the OpenAI-compatible deployment route is implemented; the
/// provider name is kept in the signature so an alternative backend can
/// slot in without touching call sites.
///
/// # Errors
/// Returns an error string for unknown provider names.
pub fn create_chat_client(
    provider: &str,
    endpoint: &str,
    deployment: &str,
) -> Result<Arc<dyn ChatClient>, String> {
    match provider.to_lowercase().as_str() {
        "deployment" | "openai" => Ok(Arc::new(DeploymentChatClient::new(endpoint, deployment))),
        _ => Err(format!("Unknown generation provider: {}", provider)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_deployment_client() {
        let client = create_chat_client("deployment", "https://openai.example.net", "gpt-4o");
        assert!(client.is_ok());
        assert_eq!(client.unwrap().provider_name(), "deployment");
    }

    #[test]
    fn test_unknown_provider() {
        match create_chat_client("mystery", "https://openai.example.net", "gpt-4o") {
            Err(err) => assert!(err.contains("Unknown generation provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
