//! OpenAI-compatible deployment provider.
//!
//! Talks to a hosted chat-completion deployment at
//! `{endpoint}/openai/deployments/{name}/chat/completions`.

use crate::client::{ChatClient, ChatMessage, ChatRequest, ChatResponse, ChatUsage};
use noctua_core::credential::{apply_auth, AuthHeader};
use noctua_core::http::build_client;
use noctua_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Chat-completion API version sent to the deployment.
const COMPLETIONS_API_VERSION: &str = "2024-10-21";

/// Resource identifier used when resolving a managed-identity token for
/// the generation service.
pub const OPENAI_TOKEN_RESOURCE: &str = "https://cognitiveservices.azure.com";

/// Deployment API request format.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Deployment API response format.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

/// Chat client for an OpenAI-compatible deployment.
pub struct DeploymentChatClient {
    endpoint: String,
    deployment: String,
    http: reqwest::Client,
}

impl DeploymentChatClient {
    /// Create a client for `deployment` hosted at `endpoint`.
    pub fn new(endpoint: impl Into<String>, deployment: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            deployment: deployment.into(),
            http: build_client(),
        }
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, COMPLETIONS_API_VERSION
        )
    }

    fn convert_response(&self, mut decoded: CompletionResponse) -> AppResult<ChatResponse> {
        let content = decoded
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(AppError::Generation(
                "Generation service returned an empty answer".to_string(),
            ));
        }

        let usage = decoded.usage.take().unwrap_or_default();

        Ok(ChatResponse {
            content,
            model: decoded.model,
            usage: ChatUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            },
        })
    }
}

#[async_trait::async_trait]
impl ChatClient for DeploymentChatClient {
    fn provider_name(&self) -> &str {
        "deployment"
    }

    async fn complete(&self, request: &ChatRequest, auth: &AuthHeader) -> AppResult<ChatResponse> {
        tracing::info!(
            "Sending completion request to deployment '{}'",
            self.deployment
        );
        tracing::debug!("Messages in request: {}", request.messages.len());

        let body = CompletionRequest {
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = apply_auth(self.http.post(self.completions_url()), auth)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("Generation request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Generation(format!(
                "Generation service error ({}): {}",
                status, error_text
            )));
        }

        let decoded: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("Malformed completion response: {}", e)))?;

        tracing::info!("Received completion from deployment '{}'", self.deployment);

        self.convert_response(decoded)
    }

    async fn probe(&self, auth: &AuthHeader) -> AppResult<()> {
        // A one-token completion is the cheapest authenticated round trip
        // the deployment route offers.
        let messages = [ChatMessage::user("ping")];
        let body = CompletionRequest {
            messages: &messages,
            max_tokens: Some(1),
            temperature: None,
        };

        let response = apply_auth(self.http.post(self.completions_url()), auth)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Generation service unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::Auth(format!(
                "Generation service rejected the connection probe ({})",
                status
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_url_shape() {
        let client = DeploymentChatClient::new("https://openai.example.net", "gpt-4o");
        assert_eq!(
            client.completions_url(),
            "https://openai.example.net/openai/deployments/gpt-4o/chat/completions?api-version=2024-10-21"
        );
    }

    #[test]
    fn test_response_conversion() {
        let client = DeploymentChatClient::new("https://openai.example.net", "gpt-4o");
        let raw = r#"{
            "model": "gpt-4o",
            "choices": [ { "message": { "role": "assistant", "content": "Street lighting [earth_at_night_508]." } } ],
            "usage": { "prompt_tokens": 812, "completion_tokens": 64, "total_tokens": 876 }
        }"#;
        let decoded: CompletionResponse = serde_json::from_str(raw).unwrap();
        let response = client.convert_response(decoded).unwrap();
        assert_eq!(response.content, "Street lighting [earth_at_night_508].");
        assert_eq!(response.usage.total_tokens, 876);
    }

    #[test]
    fn test_empty_answer_is_generation_error() {
        let client = DeploymentChatClient::new("https://openai.example.net", "gpt-4o");
        let raw = r#"{ "choices": [ { "message": { "content": "  " } } ] }"#;
        let decoded: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            client.convert_response(decoded),
            Err(AppError::Generation(_))
        ));
    }

    #[test]
    fn test_no_choices_is_generation_error() {
        let client = DeploymentChatClient::new("https://openai.example.net", "gpt-4o");
        let decoded: CompletionResponse = serde_json::from_str(r#"{ "choices": [] }"#).unwrap();
        assert!(matches!(
            client.convert_response(decoded),
            Err(AppError::Generation(_))
        ));
    }
}
