//! Knowledge-agent retrieval client.

use noctua_core::credential::{apply_auth, AuthHeader};
use noctua_core::http::build_client;
use noctua_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::types::{filter_by_threshold, RetrievedPassage};

/// Retrieval API version understood by the service.
const RETRIEVE_API_VERSION: &str = "2025-05-01-preview";

/// Resource identifier used when resolving a managed-identity token for
/// the retrieval service.
pub const SEARCH_TOKEN_RESOURCE: &str = "https://search.azure.com";

/// Retrieval request wire format.
#[derive(Debug, Serialize)]
struct RetrieveRequest<'a> {
    query: &'a str,
    #[serde(rename = "indexName")]
    index_name: &'a str,
    top: u32,
}

/// Retrieval response wire format.
#[derive(Debug, Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    references: Vec<Reference>,
}

#[derive(Debug, Deserialize)]
struct Reference {
    id: String,
    #[serde(default)]
    text: String,
    #[serde(rename = "rerankerScore", default)]
    reranker_score: f32,
}

/// Client for the hosted knowledge-agent retrieval endpoint.
///
/// Holds the agent/index names and the retrieval knobs; authentication
/// material is supplied per-call so token refresh stays outside this
/// client.
pub struct KnowledgeAgentClient {
    endpoint: String,
    agent_name: String,
    index_name: String,
    top: u32,
    threshold: f32,
    http: reqwest::Client,
}

impl KnowledgeAgentClient {
    /// Create a client for `agent_name` at `endpoint`, querying
    /// `index_name`.
    pub fn new(
        endpoint: impl Into<String>,
        agent_name: impl Into<String>,
        index_name: impl Into<String>,
        top: u32,
        threshold: f32,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            agent_name: agent_name.into(),
            index_name: index_name.into(),
            top,
            threshold,
            http: build_client(),
        }
    }

    fn retrieve_url(&self) -> String {
        format!(
            "{}/agents/{}/retrieve?api-version={}",
            self.endpoint, self.agent_name, RETRIEVE_API_VERSION
        )
    }
}

/// Seam for the retrieval side, mirroring the generation client trait so
/// the session can be exercised against test doubles.
#[async_trait::async_trait]
pub trait RetrievalClient: Send + Sync {
    /// The configured score threshold.
    fn threshold(&self) -> f32;

    /// Ask the service for passages relevant to `question`.
    async fn retrieve(&self, question: &str, auth: &AuthHeader)
        -> AppResult<Vec<RetrievedPassage>>;

    /// Cheap authenticated request used by the connection probe.
    async fn probe(&self, auth: &AuthHeader) -> AppResult<()>;
}

#[async_trait::async_trait]
impl RetrievalClient for KnowledgeAgentClient {
    fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Ask the service for passages relevant to `question`.
    ///
    /// Returns the service's references filtered by the configured
    /// threshold, in the service's ranking order. An empty vector means
    /// no passage cleared the threshold and is not an error. Transport
    /// failures and malformed bodies map to `AppError::Retrieval`; no
    /// retry is performed here.
    async fn retrieve(
        &self,
        question: &str,
        auth: &AuthHeader,
    ) -> AppResult<Vec<RetrievedPassage>> {
        tracing::info!(
            "Retrieving passages from agent '{}' (index '{}', top {})",
            self.agent_name,
            self.index_name,
            self.top
        );

        let body = RetrieveRequest {
            query: question,
            index_name: &self.index_name,
            top: self.top,
        };

        let request = apply_auth(self.http.post(self.retrieve_url()), auth).json(&body);

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Retrieval(format!("Retrieval request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Retrieval(format!(
                "Retrieval service error ({}): {}",
                status, error_text
            )));
        }

        let decoded: RetrieveResponse = response
            .json()
            .await
            .map_err(|e| AppError::Retrieval(format!("Malformed retrieval response: {}", e)))?;

        let raw_count = decoded.references.len();
        let passages: Vec<RetrievedPassage> = decoded
            .references
            .into_iter()
            .map(|r| RetrievedPassage {
                source_id: r.id,
                text: r.text,
                score: r.reranker_score,
            })
            .collect();

        let filtered = filter_by_threshold(passages, self.threshold);

        tracing::info!(
            "Retrieved {} references, {} above threshold {:.1}",
            raw_count,
            filtered.len(),
            self.threshold
        );

        Ok(filtered)
    }

    /// Cheap authenticated request used by the connection probe.
    ///
    /// A `top: 0` retrieval exercises the full path (routing, credential,
    /// agent existence) without pulling passages. Failures map to `Auth`
    /// because they gate initialization, not an answer cycle.
    async fn probe(&self, auth: &AuthHeader) -> AppResult<()> {
        let body = RetrieveRequest {
            query: "connection probe",
            index_name: &self.index_name,
            top: 0,
        };

        let response = apply_auth(self.http.post(self.retrieve_url()), auth)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Retrieval service unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::Auth(format!(
                "Retrieval service rejected the connection probe ({})",
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
    fn test_retrieve_url_shape() {
        let client = KnowledgeAgentClient::new(
            "https://search.example.net",
            "earth-knowledge-agent",
            "earth-at-night",
            5,
            2.5,
        );
        assert_eq!(
            client.retrieve_url(),
            "https://search.example.net/agents/earth-knowledge-agent/retrieve?api-version=2025-05-01-preview"
        );
    }

    #[test]
    fn test_request_body_serialization() {
        let body = RetrieveRequest {
            query: "what causes the urban heat island effect?",
            index_name: "earth-at-night",
            top: 5,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["query"], "what causes the urban heat island effect?");
        assert_eq!(json["indexName"], "earth-at-night");
        assert_eq!(json["top"], 5);
    }

    #[test]
    fn test_response_deserialization() {
        let raw = r#"{
            "references": [
                { "id": "earth_at_night_508", "text": "Urban heat islands...", "rerankerScore": 3.1 },
                { "id": "earth_at_night_13", "text": "City lights...", "rerankerScore": 1.8 }
            ]
        }"#;
        let decoded: RetrieveResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(decoded.references.len(), 2);
        assert_eq!(decoded.references[0].id, "earth_at_night_508");
        assert_eq!(decoded.references[0].reranker_score, 3.1);
    }

    #[test]
    fn test_response_without_references_decodes_empty() {
        let decoded: RetrieveResponse = serde_json::from_str("{}").unwrap();
        assert!(decoded.references.is_empty());
    }
}
