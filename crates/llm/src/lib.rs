//! Generation-service client for the Noctua chat assistant.
//!
//! This crate wraps the hosted chat-completion deployment behind a small
//! trait so the orchestration layer never touches wire formats directly.
//! All inference happens on the remote side; this is request shaping,
//! authentication headers, and response decoding only.
//!
//! # Example
//! ```no_run
//! use noctua_llm::{ChatClient, ChatMessage, ChatRequest, providers::DeploymentChatClient};
//! use noctua_core::credential::AuthHeader;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = DeploymentChatClient::new("https://openai.example.net", "gpt-4o");
//! let request = ChatRequest::new(vec![ChatMessage::user("What lights up at night?")]);
//! let auth = AuthHeader::ApiKey("secret".to_string());
//! let response = client.complete(&request, &auth).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{ChatClient, ChatMessage, ChatRequest, ChatResponse, ChatRole, ChatUsage};
pub use factory::create_chat_client;
pub use providers::DeploymentChatClient;
