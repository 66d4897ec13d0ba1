//! Chat session lifecycle and the question/answer state machine.
//!
//! A session is an explicit object handed to the surface layer, not
//! ambient module state. Lifecycle: `Uninitialized -> Connected` (via
//! `connect`), then per question `Retrieving -> Composing -> Idle`. The
//! transcript is appended only when a cycle completes; a failed cycle
//! leaves it untouched.

use std::sync::Arc;

use noctua_core::credential::Credential;
use noctua_core::http::build_client;
use noctua_core::{AppError, AppResult, Settings};
use noctua_llm::providers::deployment::OPENAI_TOKEN_RESOURCE;
use noctua_llm::{create_chat_client, ChatClient, ChatRequest};
use noctua_search::client::SEARCH_TOKEN_RESOURCE;
use noctua_search::{KnowledgeAgentClient, RetrievalClient};
use uuid::Uuid;

use crate::citations::extract_citations;
use crate::prompt::compose_messages;
use crate::types::{AskOutcome, ConversationTurn};

/// Sampling temperature for factual, cited answers.
const ANSWER_TEMPERATURE: f32 = 0.3;

/// Completion budget per answer.
const ANSWER_MAX_TOKENS: u32 = 1000;

/// Connection status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Connected,
}

struct Handles {
    search: Arc<dyn RetrievalClient>,
    chat: Arc<dyn ChatClient>,
}

/// One interactive conversation against the hosted services.
///
/// Single-session, sequential: one retrieval call then one generation
/// call per question, no concurrent cycles, no state shared across
/// sessions.
pub struct ChatSession {
    settings: Settings,
    credential: Credential,
    session_id: Uuid,
    history: Vec<ConversationTurn>,
    handles: Option<Handles>,
    http: reqwest::Client,
}

impl ChatSession {
    /// Create an unconnected session. The credential mode is fixed here;
    /// `connect` establishes and probes the service handles.
    pub fn new(settings: Settings) -> Self {
        let credential = Credential::from_settings(&settings);
        tracing::debug!("Session credential mode: {}", credential.mode_name());

        Self {
            settings,
            credential,
            session_id: Uuid::new_v4(),
            history: Vec::new(),
            handles: None,
            http: build_client(),
        }
    }

    pub fn state(&self) -> SessionState {
        if self.handles.is_some() {
            SessionState::Connected
        } else {
            SessionState::Uninitialized
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn credential_mode(&self) -> &'static str {
        self.credential.mode_name()
    }

    /// Ordered transcript of completed turns.
    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// Drop the transcript. Explicit user action only.
    pub fn clear_history(&mut self) {
        tracing::info!("Clearing transcript ({} turns)", self.history.len());
        self.history.clear();
    }

    /// Establish authenticated handles to both services.
    ///
    /// One cheap probe per service verifies the credential and
    /// reachability up front; failure surfaces as `Auth` and leaves the
    /// session uninitialized. Calling again on a connected session
    /// rebuilds the handles (the reconnect action).
    pub async fn connect(&mut self) -> AppResult<()> {
        self.handles = None;

        let search: Arc<dyn RetrievalClient> = Arc::new(KnowledgeAgentClient::new(
            &self.settings.search_endpoint,
            &self.settings.search_agent,
            &self.settings.search_index,
            self.settings.retrieval_top,
            self.settings.reranker_threshold,
        ));

        let chat = create_chat_client(
            "deployment",
            &self.settings.openai_endpoint,
            &self.settings.gpt_deployment,
        )
        .map_err(AppError::Auth)?;

        let search_auth = self
            .credential
            .auth_header(&self.http, SEARCH_TOKEN_RESOURCE)
            .await?;
        search.probe(&search_auth).await?;

        let chat_auth = self
            .credential
            .auth_header(&self.http, OPENAI_TOKEN_RESOURCE)
            .await?;
        chat.probe(&chat_auth).await?;

        tracing::info!(
            "Session {} connected (agent '{}', deployment '{}')",
            self.session_id,
            self.settings.search_agent,
            self.settings.gpt_deployment
        );

        self.handles = Some(Handles { search, chat });
        Ok(())
    }

    /// Run one question/answer cycle.
    ///
    /// Retrieval and generation errors propagate to the caller with the
    /// transcript unchanged; on success the user and assistant turns are
    /// appended in order.
    pub async fn ask(&mut self, question: &str) -> AppResult<AskOutcome> {
        let handles = self.handles.as_ref().ok_or_else(|| {
            AppError::Auth("Session is not connected; initialize the connection first".to_string())
        })?;

        // Retrieving
        let search_auth = self
            .credential
            .auth_header(&self.http, SEARCH_TOKEN_RESOURCE)
            .await?;
        let passages = handles.search.retrieve(question, &search_auth).await?;

        if passages.is_empty() {
            tracing::info!(
                "No passage cleared threshold {:.1}; composing a no-information answer",
                handles.search.threshold()
            );
        }

        // Composing
        let messages = compose_messages(question, &passages, &self.history)?;
        let request = ChatRequest::new(messages)
            .with_temperature(ANSWER_TEMPERATURE)
            .with_max_tokens(ANSWER_MAX_TOKENS);

        let chat_auth = self
            .credential
            .auth_header(&self.http, OPENAI_TOKEN_RESOURCE)
            .await?;
        let response = handles.chat.complete(&request, &chat_auth).await?;

        // Answer text is passed through verbatim; markers are only
        // annotated, never validated away.
        let citations = extract_citations(&response.content, &passages);

        self.history.push(ConversationTurn::user(question));
        self.history.push(ConversationTurn::assistant(&response.content));

        Ok(AskOutcome {
            answer: response.content,
            passages,
            citations,
        })
    }
}
