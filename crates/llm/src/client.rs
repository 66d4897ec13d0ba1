//! Chat client abstraction and request/response types.

use noctua_core::credential::AuthHeader;
use noctua_core::AppResult;
use serde::{Deserialize, Serialize};

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message in a chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Ordered messages: system instruction, replayed history, question
    pub messages: Vec<ChatMessage>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature for sampling (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ChatRequest {
    /// Create a request from an ordered message list.
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            max_tokens: None,
            temperature: None,
        }
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Chat-completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The generated answer text, verbatim from the service. Citation
    /// markers inside it are not validated here.
    pub content: String,

    /// Model that generated the response
    pub model: String,

    /// Usage statistics
    pub usage: ChatUsage,
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChatUsage {
    #[serde(default)]
    pub prompt_tokens: u32,

    #[serde(default)]
    pub completion_tokens: u32,

    #[serde(default)]
    pub total_tokens: u32,
}

/// Trait for generation-service clients.
///
/// Authentication material is passed per-call so managed-identity token
/// refresh stays with the caller.
#[async_trait::async_trait]
pub trait ChatClient: Send + Sync {
    /// Get the provider name (e.g., "deployment").
    fn provider_name(&self) -> &str;

    /// Perform one chat completion.
    ///
    /// An empty answer is a generation fault to surface, never something
    /// to silently substitute.
    async fn complete(&self, request: &ChatRequest, auth: &AuthHeader) -> AppResult<ChatResponse>;

    /// Cheap authenticated request used by the connection probe.
    async fn probe(&self, auth: &AuthHeader) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let msg = ChatMessage::system("instruction");
        assert_eq!(msg.role, ChatRole::System);
        assert_eq!(msg.content, "instruction");

        let msg = ChatMessage::assistant("answer");
        assert_eq!(msg.role, ChatRole::Assistant);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert!(json.contains("\"role\":\"user\""));
    }

    #[test]
    fn test_request_builders() {
        let request = ChatRequest::new(vec![ChatMessage::user("q")])
            .with_temperature(0.3)
            .with_max_tokens(800);
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.max_tokens, Some(800));
        assert_eq!(request.messages.len(), 1);
    }
}
