use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use query_engine::QueryOrchestrator;
use tokio::sync::Mutex;

mod chat;
mod errors;
mod health;

/// One conversation per process. The mutex serializes every request against
/// it, so the engine never sees two exchanges at once.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<QueryOrchestrator>>,
}

impl AppState {
    pub fn new(orchestrator: QueryOrchestrator) -> Self {
        Self {
            session: Arc::new(Mutex::new(orchestrator)),
        }
    }
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/v1/history", get(chat::history))
        .route("/v1/chat", post(chat::chat))
        .route("/v1/clear", post(chat::clear))
        .route("/v1/examples", get(chat::examples))
        .with_state(app_state)
}
