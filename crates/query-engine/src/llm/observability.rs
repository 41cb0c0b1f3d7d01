use std::time::{Duration, Instant};

use tracing::info;
use uuid::Uuid;

use super::transport::{
    ChatCompletionRequest, ChatCompletionResponse, ChatTransport, TransportError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportTelemetry {
    pub outcome: &'static str,
    pub latency_ms: u64,
    pub model: String,
    pub grounded: bool,
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
    pub citation_count: Option<usize>,
    pub error_type: Option<&'static str>,
}

pub async fn complete_with_telemetry(
    transport: &dyn ChatTransport,
    request: ChatCompletionRequest,
) -> (
    Result<ChatCompletionResponse, TransportError>,
    TransportTelemetry,
) {
    let model = request.model.clone();
    let grounded = request.grounding.is_some();
    let started_at = Instant::now();
    let result = transport.complete(request).await;
    let telemetry = telemetry_for_result(model, grounded, started_at.elapsed(), &result);
    (result, telemetry)
}

/// Emits one structured record per completion call. Message content stays out
/// of the log.
pub fn log_telemetry(session_id: Uuid, telemetry: &TransportTelemetry, flow: &str) {
    info!(
        flow,
        session_id = %session_id,
        outcome = telemetry.outcome,
        model = telemetry.model.as_str(),
        grounded = telemetry.grounded,
        latency_ms = telemetry.latency_ms,
        prompt_tokens = ?telemetry.prompt_tokens,
        completion_tokens = ?telemetry.completion_tokens,
        total_tokens = ?telemetry.total_tokens,
        citation_count = ?telemetry.citation_count,
        error_type = ?telemetry.error_type,
        "chat completion metrics"
    );
}

fn telemetry_for_result(
    requested_model: String,
    grounded: bool,
    latency: Duration,
    result: &Result<ChatCompletionResponse, TransportError>,
) -> TransportTelemetry {
    let latency_ms = duration_to_millis(latency);
    match result {
        Ok(response) => {
            let usage = response.usage.clone().unwrap_or_default();
            let has_usage = response.usage.is_some();

            TransportTelemetry {
                outcome: "success",
                latency_ms,
                model: response.model.clone().unwrap_or(requested_model),
                grounded,
                prompt_tokens: has_usage.then_some(usage.prompt_tokens),
                completion_tokens: has_usage.then_some(usage.completion_tokens),
                total_tokens: has_usage.then_some(usage.total_tokens),
                citation_count: response
                    .choices
                    .first()
                    .map(|choice| choice.message.citations.len()),
                error_type: None,
            }
        }
        Err(err) => TransportTelemetry {
            outcome: "failure",
            latency_ms,
            model: requested_model,
            grounded,
            prompt_tokens: None,
            completion_tokens: None,
            total_tokens: None,
            citation_count: None,
            error_type: Some(err.kind()),
        },
    }
}

fn duration_to_millis(duration: Duration) -> u64 {
    let millis = duration.as_millis();
    u64::try_from(millis).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{duration_to_millis, telemetry_for_result};
    use crate::formatter::Citation;
    use crate::llm::{ChatCompletionResponse, ChatMessage, TokenUsage, TransportError};

    #[test]
    fn success_telemetry_reports_provider_model_usage_and_citations() {
        let mut response = ChatCompletionResponse::from_message(ChatMessage {
            content: Some("Leo loves the spotlight.".to_string()),
            citations: vec![Citation::Freeform("leo.md".to_string())],
        });
        response.model = Some("gpt-4o-2024-05-13".to_string());
        response.usage = Some(TokenUsage {
            prompt_tokens: 120,
            completion_tokens: 40,
            total_tokens: 160,
        });

        let telemetry = telemetry_for_result(
            "gpt-4o".to_string(),
            true,
            Duration::from_millis(42),
            &Ok(response),
        );

        assert_eq!(telemetry.outcome, "success");
        assert_eq!(telemetry.model, "gpt-4o-2024-05-13");
        assert_eq!(telemetry.latency_ms, 42);
        assert_eq!(telemetry.total_tokens, Some(160));
        assert_eq!(telemetry.citation_count, Some(1));
        assert_eq!(telemetry.error_type, None);
    }

    #[test]
    fn failure_telemetry_keeps_requested_model_and_error_kind() {
        let telemetry = telemetry_for_result(
            "gpt-4o".to_string(),
            true,
            Duration::from_millis(7),
            &Err(TransportError::Timeout),
        );

        assert_eq!(telemetry.outcome, "failure");
        assert_eq!(telemetry.model, "gpt-4o");
        assert_eq!(telemetry.prompt_tokens, None);
        assert_eq!(telemetry.error_type, Some("timeout"));
    }

    #[test]
    fn missing_usage_leaves_token_counts_empty() {
        let telemetry = telemetry_for_result(
            "gpt-4o".to_string(),
            false,
            Duration::ZERO,
            &Ok(ChatCompletionResponse::default()),
        );

        assert_eq!(telemetry.total_tokens, None);
        assert_eq!(telemetry.citation_count, None);
        assert!(!telemetry.grounded);
    }

    #[test]
    fn oversized_durations_saturate() {
        assert_eq!(duration_to_millis(Duration::MAX), u64::MAX);
    }
}
