use std::sync::Arc;

use api_server::config::{ServerConfig, ServerConfigError};
use api_server::http::{AppState, build_router};
use query_engine::llm::AzureOpenAiTransport;
use query_engine::{
    ConfigError, ConversationStore, QueryOrchestrator, load_dotenv, resolve_system_prompt,
};
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let dotenv_result = load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "api_server=debug,query_engine=info".to_string()),
        )
        .init();

    if let Err(err) = dotenv_result {
        error!("{err}");
        std::process::exit(1);
    }

    let config = match ServerConfig::from_env() {
        Ok(cfg) => cfg,
        Err(ServerConfigError::App(ConfigError::MissingVars(missing))) => {
            error!(missing = ?missing, "missing required env vars");
            std::process::exit(1);
        }
        Err(err) => {
            error!("failed to read config: {err}");
            std::process::exit(1);
        }
    };

    let system_prompt = match resolve_system_prompt(config.app.system_prompt_file.as_deref()) {
        Ok(prompt) => prompt,
        Err(err) => {
            error!("failed to resolve system prompt: {err}");
            std::process::exit(1);
        }
    };

    let transport = match AzureOpenAiTransport::new(&config.app.chat, &config.app.transport) {
        Ok(transport) => transport,
        Err(err) => {
            error!("failed to build chat transport: {err}");
            std::process::exit(1);
        }
    };

    let orchestrator = QueryOrchestrator::new(
        ConversationStore::init(system_prompt),
        &config.app.chat,
        config.app.grounding,
        Arc::new(transport),
    );
    info!(
        session_id = %orchestrator.session_id(),
        model = orchestrator.model(),
        "zodiac guide session ready"
    );

    let app = build_router(AppState::new(orchestrator));

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {}: {err}", config.bind_addr);
            std::process::exit(1);
        }
    };

    info!(
        "api server listening on {}",
        listener.local_addr().unwrap_or(config.bind_addr)
    );
    let server = axum::serve(listener, app).with_graceful_shutdown(async {
        if signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
        }
    });
    if let Err(err) = server.await {
        error!("server stopped: {err}");
        std::process::exit(1);
    }
}
