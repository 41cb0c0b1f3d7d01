use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::time::sleep;
use tracing::debug;
use url::Url;

use super::transport::{
    ChatChoice, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatTransport,
    ChatTransportFuture, TokenUsage, TransportError,
};
use crate::config::{ChatConfig, TransportConfig};
use crate::conversation::Turn;
use crate::formatter::Citation;
use crate::grounding::GroundingDescriptor;

pub(crate) const API_KEY_HEADER: &str = "api-key";

#[derive(Debug, Error)]
pub enum AzureOpenAiSetupError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("failed to build Azure OpenAI http client: {0}")]
    HttpClient(String),
}

/// Chat-completion transport for an Azure OpenAI deployment with "on your
/// data" grounding.
#[derive(Clone)]
pub struct AzureOpenAiTransport {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    api_version: String,
    max_retries: u32,
    retry_base_backoff_ms: u64,
}

impl AzureOpenAiTransport {
    pub fn new(
        chat: &ChatConfig,
        transport: &TransportConfig,
    ) -> Result<Self, AzureOpenAiSetupError> {
        let base_url = parse_base_url(&chat.chat_endpoint)?;
        let client = build_http_client(transport.timeout_ms)?;

        Ok(Self {
            client,
            base_url,
            api_key: chat.api_key.clone(),
            api_version: transport.api_version.clone(),
            max_retries: transport.max_retries,
            retry_base_backoff_ms: transport.retry_base_backoff_ms,
        })
    }

    async fn complete_with_retries(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, TransportError> {
        let mut attempt = 0_u32;

        loop {
            match self.send_once(request).await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    if err.retryable && attempt < self.max_retries {
                        let backoff_multiplier = 2_u64.saturating_pow(attempt);
                        let backoff_ms = self
                            .retry_base_backoff_ms
                            .saturating_mul(backoff_multiplier);
                        debug!(
                            attempt,
                            backoff_ms,
                            error_type = err.error.kind(),
                            "retrying chat completion request"
                        );
                        sleep(Duration::from_millis(backoff_ms)).await;
                        attempt = attempt.saturating_add(1);
                        continue;
                    }

                    return Err(err.error);
                }
            }
        }
    }

    async fn send_once(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, SendAttemptError> {
        let url = deployment_url(&self.base_url, &request.model, &self.api_version);
        let body = CompletionBody {
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            data_sources: request.grounding.as_ref().map(|descriptor| [descriptor]),
        };

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    SendAttemptError::retryable(TransportError::Timeout)
                } else {
                    SendAttemptError::retryable(TransportError::Unavailable(err.to_string()))
                }
            })?;

        let status = response.status();
        let header_request_id = header_request_id(response.headers());
        let body = response.text().await.map_err(|err| {
            SendAttemptError::non_retryable(TransportError::InvalidPayload(format!(
                "response_body_read_failed: {err}"
            )))
        })?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        let parsed: CompletionEnvelope = serde_json::from_str(&body).map_err(|err| {
            SendAttemptError::non_retryable(TransportError::InvalidPayload(format!(
                "response_json_parse_failed: {err}"
            )))
        })?;

        Ok(ChatCompletionResponse {
            model: parsed.model,
            request_id: header_request_id.or(parsed.id),
            choices: parsed
                .choices
                .into_iter()
                .map(|choice| ChatChoice {
                    message: choice.message.map(into_chat_message).unwrap_or_default(),
                })
                .collect(),
            usage: parsed.usage.map(|usage| TokenUsage {
                prompt_tokens: clamp_u64_to_u32(usage.prompt_tokens.unwrap_or(0)),
                completion_tokens: clamp_u64_to_u32(usage.completion_tokens.unwrap_or(0)),
                total_tokens: clamp_u64_to_u32(usage.total_tokens.unwrap_or(0)),
            }),
        })
    }
}

impl ChatTransport for AzureOpenAiTransport {
    fn complete<'a>(&'a self, request: ChatCompletionRequest) -> ChatTransportFuture<'a> {
        Box::pin(async move { self.complete_with_retries(&request).await })
    }
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    messages: &'a [Turn],
    temperature: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_sources: Option<[&'a GroundingDescriptor; 1]>,
}

#[derive(Debug)]
struct SendAttemptError {
    error: TransportError,
    retryable: bool,
}

impl SendAttemptError {
    fn retryable(error: TransportError) -> Self {
        Self {
            error,
            retryable: true,
        }
    }

    fn non_retryable(error: TransportError) -> Self {
        Self {
            error,
            retryable: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionEnvelope {
    id: Option<String>,
    model: Option<String>,
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
    context: Option<CompletionContext>,
}

#[derive(Debug, Deserialize)]
struct CompletionContext {
    #[serde(default)]
    citations: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct CompletionUsage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
    total_tokens: Option<u64>,
}

fn into_chat_message(message: CompletionMessage) -> ChatMessage {
    ChatMessage {
        content: message.content,
        citations: message
            .context
            .map(|context| context.citations.iter().map(Citation::from_value).collect())
            .unwrap_or_default(),
    }
}

pub(crate) fn parse_base_url(endpoint: &str) -> Result<Url, AzureOpenAiSetupError> {
    let url =
        Url::parse(endpoint).map_err(|err| AzureOpenAiSetupError::InvalidEndpoint(err.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(AzureOpenAiSetupError::InvalidEndpoint(format!(
            "{endpoint} cannot carry a request path"
        )));
    }
    Ok(url)
}

pub(crate) fn build_http_client(timeout_ms: u64) -> Result<reqwest::Client, AzureOpenAiSetupError> {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .map_err(|err| AzureOpenAiSetupError::HttpClient(err.to_string()))
}

/// Appends `segments` to the endpoint path and replaces the query with
/// `api-version`. `base` must be a hierarchical URL (see [`parse_base_url`]).
pub(crate) fn endpoint_url(base: &Url, segments: &[&str], api_version: &str) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url.query_pairs_mut()
        .clear()
        .append_pair("api-version", api_version);
    url
}

fn deployment_url(base: &Url, model: &str, api_version: &str) -> Url {
    endpoint_url(
        base,
        &["openai", "deployments", model, "chat", "completions"],
        api_version,
    )
}

fn status_error(status: StatusCode, body: &str) -> SendAttemptError {
    let (code, message) = parse_provider_error(body);
    let detail = match message {
        Some(message) => format!("status={} code={code} message={message}", status.as_u16()),
        None => format!("status={} code={code}", status.as_u16()),
    };

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return SendAttemptError::non_retryable(TransportError::Unauthorized(detail));
    }

    SendAttemptError {
        error: TransportError::ServiceFailure(detail),
        retryable: is_retryable_status(status),
    }
}

pub(crate) fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn header_request_id(headers: &HeaderMap) -> Option<String> {
    ["apim-request-id", "x-request-id"]
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string)
}

pub(crate) fn parse_provider_error(body: &str) -> (String, Option<String>) {
    #[derive(Deserialize)]
    struct ProviderErrorEnvelope {
        error: Option<ProviderErrorDetails>,
    }

    #[derive(Deserialize)]
    struct ProviderErrorDetails {
        code: Option<Value>,
        message: Option<String>,
    }

    let Some(details) = serde_json::from_str::<ProviderErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
    else {
        return ("unknown".to_string(), None);
    };

    let code = match details.code {
        Some(Value::String(code)) => code,
        Some(Value::Number(code)) => code.to_string(),
        _ => "unknown".to_string(),
    };
    (code, details.message.filter(|message| !message.trim().is_empty()))
}

fn clamp_u64_to_u32(value: u64) -> u32 {
    value.min(u32::MAX as u64) as u32
}
