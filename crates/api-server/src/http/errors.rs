use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use query_engine::OrchestratorError;
use tracing::{error, warn};

use crate::models::{ErrorBody, ErrorResponse};

pub(super) fn bad_request_response(code: &str, message: &str) -> Response {
    error_response(StatusCode::BAD_REQUEST, code, message)
}

pub(super) fn bad_gateway_response(code: &str, message: &str) -> Response {
    error_response(StatusCode::BAD_GATEWAY, code, message)
}

pub(super) fn internal_error_response() -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "Unexpected server error",
    )
}

pub(super) fn orchestrator_error_response(err: OrchestratorError) -> Response {
    match err {
        OrchestratorError::InvalidInput => {
            bad_request_response("invalid_input", "Message cannot be empty")
        }
        OrchestratorError::Transport(err) => {
            warn!(error_type = err.kind(), "chat exchange failed upstream: {err}");
            bad_gateway_response("upstream_failure", &err.to_string())
        }
    }
}

pub(super) fn task_failure_response(err: tokio::task::JoinError) -> Response {
    error!("chat exchange task did not complete: {err}");
    internal_error_response()
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: message.to_string(),
            },
        }),
    )
        .into_response()
}
