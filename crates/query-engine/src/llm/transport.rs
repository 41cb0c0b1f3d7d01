use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::conversation::Turn;
use crate::formatter::Citation;
use crate::grounding::GroundingDescriptor;

pub type ChatTransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ChatCompletionResponse, TransportError>> + Send + 'a>>;

#[derive(Debug, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Turn>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub grounding: Option<GroundingDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ChatCompletionResponse {
    pub model: Option<String>,
    pub request_id: Option<String>,
    pub choices: Vec<ChatChoice>,
    pub usage: Option<TokenUsage>,
}

impl ChatCompletionResponse {
    /// Single-choice response, the shape every grounded completion returns.
    pub fn from_message(message: ChatMessage) -> Self {
        Self {
            choices: vec![ChatChoice { message }],
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatMessage {
    pub content: Option<String>,
    pub citations: Vec<Citation>,
}

impl ChatMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            citations: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("chat completion request timed out")]
    Timeout,
    #[error("chat completion service unreachable: {0}")]
    Unavailable(String),
    #[error("chat completion request rejected: {0}")]
    Unauthorized(String),
    #[error("chat completion service failed: {0}")]
    ServiceFailure(String),
    #[error("chat completion service returned an invalid payload: {0}")]
    InvalidPayload(String),
}

impl TransportError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Unavailable(_) => "unavailable",
            Self::Unauthorized(_) => "unauthorized",
            Self::ServiceFailure(_) => "service_failure",
            Self::InvalidPayload(_) => "invalid_payload",
        }
    }
}

/// The chat-completion service as seen by the engine. Implementations own
/// their own timeout and retry policy; a returned error is final.
pub trait ChatTransport: Send + Sync {
    fn complete<'a>(&'a self, request: ChatCompletionRequest) -> ChatTransportFuture<'a>;
}
