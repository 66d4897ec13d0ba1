//! Retrieval result types and threshold filtering.

use serde::{Deserialize, Serialize};

/// Default minimum reranker score a passage must reach to be used as
/// answer context. Reranker scores range 0-4; 2.5 drops weakly related
/// passages while keeping recall reasonable.
pub const DEFAULT_RERANKER_THRESHOLD: f32 = 2.5;

/// One passage returned by the retrieval service for a question.
///
/// Lifetime is a single question/answer cycle; passages are never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// Document id cited as `[id]` in generated answers
    pub source_id: String,

    /// Chunk text used as answer context
    pub text: String,

    /// Reranker score assigned by the service
    pub score: f32,
}

/// Keep passages meeting the threshold, preserving the service's ordering.
///
/// The service already returns references ranked descending by score; this
/// never re-ranks, only drops. Applying the same threshold twice yields the
/// same sequence. Zero survivors is a valid outcome, reported upward as
/// "no relevant information" rather than an error.
pub fn filter_by_threshold(
    passages: Vec<RetrievedPassage>,
    threshold: f32,
) -> Vec<RetrievedPassage> {
    passages
        .into_iter()
        .filter(|p| p.score >= threshold)
        .collect()
}
