//! Retrieval client for the hosted knowledge-agent service.
//!
//! Ranking, similarity, and reranking all happen on the remote side. This
//! crate only forms the query request, decodes the scored references, and
//! applies the configured count limit and score threshold without changing
//! the service's ordering.

pub mod client;
pub mod types;

pub use client::{KnowledgeAgentClient, RetrievalClient};
pub use types::{filter_by_threshold, RetrievedPassage, DEFAULT_RERANKER_THRESHOLD};
