//! One grounded request/response cycle per [`QueryOrchestrator::ask`].
//!
//! Every exchange runs `Idle -> Sending -> Succeeded | Failed -> Idle`. A
//! failed exchange rolls the pending user turn back out of the history, so the
//! store after a failure is identical to the store before the call and a retry
//! never accumulates duplicate turns.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ChatConfig;
use crate::conversation::{ConversationError, ConversationStore, Turn};
use crate::formatter::format_response;
use crate::grounding::{GroundingConfig, build_grounding_descriptor};
use crate::llm::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatTransport, TransportError,
    complete_with_telemetry, log_telemetry,
};

pub const SAMPLING_TEMPERATURE: f64 = 0.7;
pub const MAX_RESPONSE_TOKENS: u32 = 2000;
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    Sending,
    Succeeded,
    Failed,
}

impl ExchangeState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Sending => "sending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("message cannot be empty")]
    InvalidInput,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<ConversationError> for OrchestratorError {
    fn from(err: ConversationError) -> Self {
        match err {
            ConversationError::InvalidInput => Self::InvalidInput,
        }
    }
}

/// Owns one session's history and drives grounded exchanges against a
/// [`ChatTransport`]. `ask` takes `&mut self`, so a second exchange cannot
/// start while one is in flight.
pub struct QueryOrchestrator {
    session_id: Uuid,
    store: ConversationStore,
    grounding: GroundingConfig,
    model: String,
    transport: Arc<dyn ChatTransport>,
    state: ExchangeState,
}

impl QueryOrchestrator {
    pub fn new(
        store: ConversationStore,
        chat: &ChatConfig,
        grounding: GroundingConfig,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            store,
            grounding,
            model: resolve_model(&chat.model_deployment_name),
            transport,
            state: ExchangeState::Idle,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn history(&self) -> &[Turn] {
        self.store.snapshot()
    }

    pub fn into_store(self) -> ConversationStore {
        self.store
    }

    pub async fn ask(&mut self, user_text: &str) -> Result<String, OrchestratorError> {
        if user_text.trim().is_empty() {
            return Err(OrchestratorError::InvalidInput);
        }
        self.recover_abandoned_exchange();

        self.transition(ExchangeState::Sending);
        if let Err(err) = self.store.append_user(user_text) {
            self.transition(ExchangeState::Idle);
            return Err(err.into());
        }

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: self.store.snapshot().to_vec(),
            temperature: SAMPLING_TEMPERATURE,
            max_tokens: MAX_RESPONSE_TOKENS,
            grounding: Some(build_grounding_descriptor(&self.grounding)),
        };
        let (result, telemetry) = complete_with_telemetry(self.transport.as_ref(), request).await;
        log_telemetry(self.session_id, &telemetry, "ask");

        let outcome = match result.and_then(first_choice) {
            Ok(message) => {
                let text = message.content.unwrap_or_default();
                self.store.append_assistant(text.clone());
                self.transition(ExchangeState::Succeeded);
                Ok(format_response(&text, &message.citations))
            }
            Err(err) => {
                self.store.rollback_last_user();
                self.transition(ExchangeState::Failed);
                warn!(
                    session_id = %self.session_id,
                    error_type = err.kind(),
                    turns = self.store.snapshot().len(),
                    "chat exchange failed; user turn rolled back: {err}"
                );
                Err(OrchestratorError::Transport(err))
            }
        };

        self.transition(ExchangeState::Idle);
        outcome
    }

    pub fn clear(&mut self) {
        self.recover_abandoned_exchange();
        self.store.reset();
        debug!(session_id = %self.session_id, "conversation cleared");
    }

    fn transition(&mut self, next: ExchangeState) {
        debug!(
            session_id = %self.session_id,
            from = self.state.as_str(),
            to = next.as_str(),
            "exchange state transition"
        );
        self.state = next;
    }

    /// An `ask` future dropped while awaiting the transport leaves the state at
    /// `Sending` with its user turn still appended. Treat that as a failure.
    fn recover_abandoned_exchange(&mut self) {
        if self.state != ExchangeState::Sending {
            return;
        }

        warn!(
            session_id = %self.session_id,
            "previous exchange was abandoned mid-flight; rolling back its user turn"
        );
        self.store.rollback_last_user();
        self.transition(ExchangeState::Failed);
        self.transition(ExchangeState::Idle);
    }
}

fn first_choice(response: ChatCompletionResponse) -> Result<ChatMessage, TransportError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| TransportError::InvalidPayload("missing_choice".to_string()))
}

fn resolve_model(configured: &str) -> String {
    let trimmed = configured.trim();
    if trimmed.is_empty() {
        DEFAULT_CHAT_MODEL.to_string()
    } else {
        trimmed.to_string()
    }
}
