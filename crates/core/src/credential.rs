//! Credential resolution for the hosted services.
//!
//! Two mutually exclusive modes, chosen once from settings:
//! - **Managed identity**: a bearer token resolved from the ambient
//!   instance-metadata endpoint. Rotation-free; preferred whenever identity
//!   material is configured, even if an API key is also present.
//! - **API key**: a static secret sent as the `api-key` header.

use serde::Deserialize;

use crate::config::Settings;
use crate::error::{AppError, AppResult};

/// Default ambient token endpoint (instance metadata service).
const DEFAULT_IDENTITY_ENDPOINT: &str =
    "http://169.254.169.254/metadata/identity/oauth2/token";

/// Token API version understood by the metadata service.
const IDENTITY_API_VERSION: &str = "2018-02-01";

/// Credential mode, selected once during initialization.
#[derive(Debug, Clone, PartialEq)]
pub enum Credential {
    /// Ambient identity token resolution chain.
    ManagedIdentity {
        /// User-assigned identity to request, if any
        client_id: Option<String>,
        /// Token endpoint (instance metadata service unless overridden)
        token_endpoint: String,
    },

    /// Static secret from configuration.
    ApiKey(String),
}

/// Header to attach to an outgoing service request.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthHeader {
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// `api-key: <secret>`
    ApiKey(String),
}

/// Token response shape from the metadata service.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl Credential {
    /// Select the credential mode from settings.
    ///
    /// Identity material present wins over an API key; with neither
    /// configured the ambient chain is still attempted, so a bare
    /// environment running under a platform identity works without any
    /// secret.
    pub fn from_settings(settings: &Settings) -> Self {
        let identity_configured =
            settings.identity_client_id.is_some() || settings.identity_endpoint.is_some();

        match settings.api_key.clone() {
            Some(secret) if !identity_configured => Credential::ApiKey(secret),
            _ => Credential::ManagedIdentity {
                client_id: settings.identity_client_id.clone(),
                token_endpoint: settings
                    .identity_endpoint
                    .clone()
                    .unwrap_or_else(|| DEFAULT_IDENTITY_ENDPOINT.to_string()),
            },
        }
    }

    /// Short mode name for status displays.
    pub fn mode_name(&self) -> &'static str {
        match self {
            Credential::ManagedIdentity { .. } => "managed-identity",
            Credential::ApiKey(_) => "api-key",
        }
    }

    /// Resolve the header to send for a request against `resource`.
    ///
    /// API-key mode returns immediately; managed-identity mode fetches a
    /// token from the ambient endpoint. Failure to obtain a token is an
    /// `Auth` error and is never retried here.
    pub async fn auth_header(
        &self,
        http: &reqwest::Client,
        resource: &str,
    ) -> AppResult<AuthHeader> {
        match self {
            Credential::ApiKey(secret) => Ok(AuthHeader::ApiKey(secret.clone())),
            Credential::ManagedIdentity {
                client_id,
                token_endpoint,
            } => {
                let mut request = http
                    .get(token_endpoint)
                    .header("Metadata", "true")
                    .query(&[
                        ("api-version", IDENTITY_API_VERSION),
                        ("resource", resource),
                    ]);

                if let Some(client_id) = client_id {
                    request = request.query(&[("client_id", client_id.as_str())]);
                }

                let response = request.send().await.map_err(|e| {
                    AppError::Auth(format!("Token endpoint unreachable: {}", e))
                })?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    return Err(AppError::Auth(format!(
                        "Token request rejected ({}): {}",
                        status, body
                    )));
                }

                let token: TokenResponse = response.json().await.map_err(|e| {
                    AppError::Auth(format!("Malformed token response: {}", e))
                })?;

                tracing::debug!("Resolved managed-identity token for {}", resource);
                Ok(AuthHeader::Bearer(token.access_token))
            }
        }
    }
}

/// Apply an auth header to an outgoing request builder.
pub fn apply_auth(request: reqwest::RequestBuilder, header: &AuthHeader) -> reqwest::RequestBuilder {
    match header {
        AuthHeader::Bearer(token) => request.bearer_auth(token),
        AuthHeader::ApiKey(secret) => request.header("api-key", secret),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_with(api_key: Option<&str>, identity_client_id: Option<&str>) -> Settings {
        let mut env = HashMap::new();
        env.insert(
            "NOCTUA_SEARCH_ENDPOINT".to_string(),
            "https://search.example.net".to_string(),
        );
        env.insert(
            "NOCTUA_OPENAI_ENDPOINT".to_string(),
            "https://openai.example.net".to_string(),
        );
        env.insert("NOCTUA_CONFIG".to_string(), "/nonexistent/noctua.yaml".to_string());
        if let Some(key) = api_key {
            env.insert("NOCTUA_API_KEY".to_string(), key.to_string());
        }
        if let Some(id) = identity_client_id {
            env.insert("NOCTUA_IDENTITY_CLIENT_ID".to_string(), id.to_string());
        }
        Settings::from_sources(&env).unwrap()
    }

    #[test]
    fn test_api_key_mode_selected() {
        let settings = settings_with(Some("secret"), None);
        let credential = Credential::from_settings(&settings);
        assert_eq!(credential, Credential::ApiKey("secret".to_string()));
        assert_eq!(credential.mode_name(), "api-key");
    }

    #[test]
    fn test_managed_identity_wins_when_both_present() {
        let settings = settings_with(Some("secret"), Some("11111111-2222"));
        let credential = Credential::from_settings(&settings);
        match credential {
            Credential::ManagedIdentity { client_id, .. } => {
                assert_eq!(client_id.as_deref(), Some("11111111-2222"));
            }
            other => panic!("Expected managed identity, got {:?}", other),
        }
    }

    #[test]
    fn test_ambient_chain_is_the_default() {
        let settings = settings_with(None, None);
        let credential = Credential::from_settings(&settings);
        match credential {
            Credential::ManagedIdentity {
                client_id,
                token_endpoint,
            } => {
                assert!(client_id.is_none());
                assert_eq!(token_endpoint, DEFAULT_IDENTITY_ENDPOINT);
            }
            other => panic!("Expected managed identity, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_api_key_header_needs_no_network() {
        let credential = Credential::ApiKey("secret".to_string());
        let http = reqwest::Client::new();
        let header = credential
            .auth_header(&http, "https://search.example.net")
            .await
            .unwrap();
        assert_eq!(header, AuthHeader::ApiKey("secret".to_string()));
    }
}
