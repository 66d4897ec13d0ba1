//! Generation-service provider implementations.

pub mod deployment;

pub use deployment::DeploymentChatClient;
