//! Prompt composition for the question/answer cycle.
//!
//! Builds the ordered message list sent to the generation service: a fixed
//! system instruction, the running conversation history, and a final user
//! message carrying the retrieved passages (each tagged with its source id)
//! plus the new question.

use handlebars::Handlebars;
use noctua_core::{AppError, AppResult};
use noctua_llm::ChatMessage;
use noctua_search::RetrievedPassage;

use crate::types::{ConversationTurn, TurnRole};

/// System instruction template. `no_sources` flips the directive for turns
/// where nothing cleared the relevance threshold.
const INSTRUCTION_TEMPLATE: &str = "\
A Q&A assistant specializing in Earth at night topics including:
- Nighttime satellite imagery and observations
- Urban lighting patterns and light pollution
- Nocturnal ecosystems and wildlife
- Disaster monitoring using night imagery
- Human activity patterns visible from space
- Climate monitoring and urban heat island effects
- Bioluminescence in marine environments

Sources are text chunks from processed documents. Each source carries an id
that must be cited in your answer using the format [id]. Refer to sources
only by their id.
{{#if no_sources}}
No sources were found for this question. Respond with \"I don't know\" and
do not invent citations or source ids.
{{else}}
If the provided sources do not contain the answer, respond with
\"I don't know\". Cite every claim with the id of the source supporting it,
and cite multiple relevant sources when available.
{{/if}}";

/// Separator between source blocks in the user message.
const SOURCE_SEPARATOR: &str = "\n\n---\n\n";

/// Render the system instruction.
fn render_instruction(no_sources: bool) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text output, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("instruction", INSTRUCTION_TEMPLATE)
        .map_err(|e| AppError::Generation(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("instruction", &serde_json::json!({ "no_sources": no_sources }))
        .map_err(|e| AppError::Generation(format!("Failed to render instruction: {}", e)))
}

/// Format retrieved passages as tagged source blocks, service order
/// preserved.
fn format_sources(passages: &[RetrievedPassage]) -> String {
    if passages.is_empty() {
        return "(no sources cleared the relevance threshold)".to_string();
    }

    passages
        .iter()
        .map(|p| format!("[{}]\n{}", p.source_id, p.text))
        .collect::<Vec<_>>()
        .join(SOURCE_SEPARATOR)
}

/// Build the full message list for one question.
///
/// History is replayed as alternating chat messages so the service sees
/// the same transcript the user does; only the final user message carries
/// source context.
pub fn compose_messages(
    question: &str,
    passages: &[RetrievedPassage],
    history: &[ConversationTurn],
) -> AppResult<Vec<ChatMessage>> {
    let mut messages = Vec::with_capacity(history.len() + 2);

    messages.push(ChatMessage::system(render_instruction(passages.is_empty())?));

    for turn in history {
        messages.push(match turn.role {
            TurnRole::User => ChatMessage::user(turn.text.clone()),
            TurnRole::Assistant => ChatMessage::assistant(turn.text.clone()),
        });
    }

    messages.push(ChatMessage::user(format!(
        "Sources:\n{}\n\nQuestion:\n{}",
        format_sources(passages),
        question
    )));

    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use noctua_llm::ChatRole;

    fn passage(id: &str, text: &str) -> RetrievedPassage {
        RetrievedPassage {
            source_id: id.to_string(),
            text: text.to_string(),
            score: 3.0,
        }
    }

    #[test]
    fn test_messages_ordered_system_history_question() {
        let history = vec![
            ConversationTurn::user("earlier question"),
            ConversationTurn::assistant("earlier answer"),
        ];
        let passages = vec![passage("doc1", "Night lights.")];
        let messages = compose_messages("new question", &passages, &history).unwrap();

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, ChatRole::System);
        assert_eq!(messages[1].role, ChatRole::User);
        assert_eq!(messages[1].content, "earlier question");
        assert_eq!(messages[2].role, ChatRole::Assistant);
        assert_eq!(messages[3].role, ChatRole::User);
        assert!(messages[3].content.contains("new question"));
    }

    #[test]
    fn test_sources_tagged_with_ids() {
        let passages = vec![
            passage("earth_at_night_508", "Urban heat islands."),
            passage("earth_at_night_13", "City lights."),
        ];
        let messages = compose_messages("q", &passages, &[]).unwrap();
        let user = &messages.last().unwrap().content;

        assert!(user.contains("[earth_at_night_508]\nUrban heat islands."));
        assert!(user.contains("[earth_at_night_13]\nCity lights."));
        // order preserved
        assert!(
            user.find("earth_at_night_508").unwrap() < user.find("earth_at_night_13").unwrap()
        );
    }

    #[test]
    fn test_instruction_mentions_citation_format() {
        let messages = compose_messages("q", &[passage("doc1", "t")], &[]).unwrap();
        let system = &messages[0].content;
        assert!(system.contains("[id]"));
        assert!(system.contains("I don't know"));
        assert!(!system.contains("No sources were found"));
    }

    #[test]
    fn test_empty_passages_forbid_fabricated_citations() {
        // Composition still succeeds with zero passages; the instruction
        // directs the model to answer that it lacks information.
        let messages = compose_messages("q", &[], &[]).unwrap();
        let system = &messages[0].content;
        assert!(system.contains("No sources were found"));
        assert!(system.contains("do not invent citations"));

        let user = &messages.last().unwrap().content;
        assert!(user.contains("no sources cleared the relevance threshold"));
    }
}
