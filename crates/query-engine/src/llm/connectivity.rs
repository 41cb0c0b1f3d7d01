use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::azure_openai::{
    API_KEY_HEADER, AzureOpenAiSetupError, build_http_client, endpoint_url, parse_base_url,
    parse_provider_error,
};
use super::transport::{ChatCompletionRequest, ChatTransport, TransportError};
use crate::config::TransportConfig;
use crate::conversation::Turn;
use crate::grounding::GroundingConfig;

pub const CONNECTION_CHECK_PROMPT: &str = "Hello! Please respond with 'Connection successful!'";
const CONNECTION_CHECK_MAX_TOKENS: u32 = 50;
const SEARCH_PROBE_QUERY: &str = "zodiac";

/// Sends one ungrounded message and returns the reply text.
pub async fn check_chat_connection(
    transport: &dyn ChatTransport,
    model: &str,
) -> Result<String, TransportError> {
    let response = transport
        .complete(ChatCompletionRequest {
            model: model.to_string(),
            messages: vec![Turn::user(CONNECTION_CHECK_PROMPT)],
            temperature: 0.0,
            max_tokens: CONNECTION_CHECK_MAX_TOKENS,
            grounding: None,
        })
        .await?;

    let choice = response.choices.into_iter().next().ok_or_else(|| {
        TransportError::InvalidPayload("missing_choice".to_string())
    })?;
    Ok(choice.message.content.unwrap_or_default())
}

/// Runs a one-document query against the search index the chat service
/// grounds on, so a broken index or key shows up before the first question.
#[derive(Clone)]
pub struct SearchIndexProbe {
    client: reqwest::Client,
    api_version: String,
}

impl SearchIndexProbe {
    pub fn new(transport: &TransportConfig) -> Result<Self, AzureOpenAiSetupError> {
        Ok(Self {
            client: build_http_client(transport.timeout_ms)?,
            api_version: transport.search_api_version.clone(),
        })
    }

    /// Returns how many documents the probe query matched (0 or 1).
    pub async fn probe(&self, config: &GroundingConfig) -> Result<usize, TransportError> {
        let base = parse_base_url(&config.search_endpoint)
            .map_err(|err| TransportError::Unavailable(err.to_string()))?;
        let url = endpoint_url(
            &base,
            &["indexes", config.index_name.as_str(), "docs", "search"],
            &self.api_version,
        );
        debug!(index = config.index_name.as_str(), "probing search index");

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &config.api_key)
            .json(&json!({ "search": SEARCH_PROBE_QUERY, "top": 1 }))
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Unavailable(err.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            TransportError::InvalidPayload(format!("response_body_read_failed: {err}"))
        })?;

        if !status.is_success() {
            let (code, _) = parse_provider_error(&body);
            let detail = format!("status={} code={code}", status.as_u16());
            return Err(if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                TransportError::Unauthorized(detail)
            } else {
                TransportError::ServiceFailure(detail)
            });
        }

        #[derive(Deserialize)]
        struct SearchResults {
            value: Vec<Value>,
        }

        let results: SearchResults = serde_json::from_str(&body).map_err(|err| {
            TransportError::InvalidPayload(format!("response_json_parse_failed: {err}"))
        })?;
        Ok(results.value.len())
    }
}
