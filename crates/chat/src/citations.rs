//! Citation marker extraction.
//!
//! Answers are expected to carry `[sourceId]` markers pointing at the
//! passages supplied for the same turn. The composer returns answer text
//! verbatim, so a marker may reference an id that was never retrieved;
//! extraction reports that instead of rewriting the answer.

use noctua_search::RetrievedPassage;
use serde::{Deserialize, Serialize};

/// A citation marker found in answer text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// The id between the brackets
    pub source_id: String,

    /// Whether a passage with this id was retrieved for the same turn
    pub resolved: bool,
}

/// Scan `answer` for `[id]` markers and check each against the retrieved
/// passage set. Order of first appearance, duplicates collapsed. The
/// answer itself is never modified.
pub fn extract_citations(answer: &str, passages: &[RetrievedPassage]) -> Vec<Citation> {
    let mut citations: Vec<Citation> = Vec::new();

    let mut rest = answer;
    while let Some(open) = rest.find('[') {
        rest = &rest[open + 1..];
        let Some(close) = rest.find(']') else {
            break;
        };
        let candidate = &rest[..close];
        rest = &rest[close + 1..];

        // Markers are single-token ids; anything with spaces or nested
        // brackets is prose, not a citation.
        if candidate.is_empty()
            || candidate.contains(char::is_whitespace)
            || candidate.contains('[')
        {
            continue;
        }

        if citations.iter().any(|c| c.source_id == candidate) {
            continue;
        }

        citations.push(Citation {
            source_id: candidate.to_string(),
            resolved: passages.iter().any(|p| p.source_id == candidate),
        });
    }

    citations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(id: &str) -> RetrievedPassage {
        RetrievedPassage {
            source_id: id.to_string(),
            text: "text".to_string(),
            score: 3.0,
        }
    }

    #[test]
    fn test_extracts_in_order_of_appearance() {
        let passages = vec![passage("doc2"), passage("doc1")];
        let citations = extract_citations("First [doc1], then [doc2].", &passages);
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].source_id, "doc1");
        assert_eq!(citations[1].source_id, "doc2");
        assert!(citations.iter().all(|c| c.resolved));
    }

    #[test]
    fn test_duplicates_collapsed() {
        let passages = vec![passage("doc1")];
        let citations = extract_citations("[doc1] and again [doc1]", &passages);
        assert_eq!(citations.len(), 1);
    }

    #[test]
    fn test_unretrieved_marker_reported_unresolved() {
        // The answer text passes through untouched even when the model
        // cites an id that was never retrieved.
        let passages = vec![passage("doc1")];
        let answer = "Cities glow [a42].";
        let citations = extract_citations(answer, &passages);
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].source_id, "a42");
        assert!(!citations[0].resolved);
    }

    #[test]
    fn test_prose_brackets_ignored() {
        let citations = extract_citations("Lights [seen from orbit] fade.", &[]);
        assert!(citations.is_empty());
    }

    #[test]
    fn test_no_markers() {
        let citations = extract_citations("No citations here.", &[passage("doc1")]);
        assert!(citations.is_empty());
    }
}
