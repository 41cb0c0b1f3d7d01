use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use query_engine::EXAMPLE_QUESTIONS;
use tracing::info;

use super::AppState;
use super::errors::{bad_request_response, orchestrator_error_response, task_failure_response};
use crate::models::{ChatRequest, ChatResponse, ExamplesResponse, HistoryResponse, OkResponse};

pub(super) async fn history(State(state): State<AppState>) -> Response {
    let session = state.session.lock().await;
    let turns = session.history().to_vec();

    (StatusCode::OK, Json(HistoryResponse { turns })).into_response()
}

/// The exchange runs on its own task holding the session lock, so a client
/// that disconnects mid-request cannot cancel it halfway through.
pub(super) async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return bad_request_response("invalid_input", &rejection.body_text());
        }
    };

    let mut session = state.session.clone().lock_owned().await;
    let exchange = tokio::spawn(async move {
        let result = session.ask(&request.message).await;
        let turns = session.history().to_vec();
        (result, turns)
    });

    match exchange.await {
        Ok((Ok(reply), turns)) => {
            info!(turns = turns.len(), "chat exchange completed");
            (StatusCode::OK, Json(ChatResponse { reply, turns })).into_response()
        }
        Ok((Err(err), _)) => orchestrator_error_response(err),
        Err(err) => task_failure_response(err),
    }
}

pub(super) async fn clear(State(state): State<AppState>) -> Response {
    state.session.lock().await.clear();
    info!("conversation cleared");

    (StatusCode::OK, Json(OkResponse { ok: true })).into_response()
}

pub(super) async fn examples() -> impl IntoResponse {
    let questions = EXAMPLE_QUESTIONS
        .iter()
        .map(|question| question.to_string())
        .collect();

    (StatusCode::OK, Json(ExamplesResponse { questions }))
}
