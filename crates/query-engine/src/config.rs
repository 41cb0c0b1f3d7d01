use std::env;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::config_env::{optional_trimmed, parse_u32, parse_u64, require_all, require_http_url};
use crate::grounding::GroundingConfig;

pub const DEFAULT_OPENAI_API_VERSION: &str = "2023-12-01-preview";
pub const DEFAULT_SEARCH_API_VERSION: &str = "2023-11-01";
const DEFAULT_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_RETRY_BASE_BACKOFF_MS: u64 = 250;

pub const REQUIRED_VARS: [&str; 7] = [
    "OPENAI_API_KEY",
    "OPENAI_ENDPOINT",
    "CHAT_MODEL",
    "EMBEDDING_MODEL",
    "SEARCH_API_KEY",
    "SEARCH_ENDPOINT",
    "INDEX_NAME",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env vars: {}", .0.join(", "))]
    MissingVars(Vec<String>),
    #[error("invalid integer in env var {0}")]
    ParseInt(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("failed to load .env file: {0}")]
    Dotenv(String),
    #[error("failed to read persona file {path}: {reason}")]
    PersonaFile { path: String, reason: String },
}

#[derive(Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub chat_endpoint: String,
    pub api_key: String,
    pub model_deployment_name: String,
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("chat_endpoint", &self.chat_endpoint)
            .field("api_key", &"<redacted>")
            .field("model_deployment_name", &self.model_deployment_name)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub api_version: String,
    pub search_api_version: String,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_base_backoff_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_OPENAI_API_VERSION.to_string(),
            search_api_version: DEFAULT_SEARCH_API_VERSION.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_backoff_ms: DEFAULT_RETRY_BASE_BACKOFF_MS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub chat: ChatConfig,
    pub grounding: GroundingConfig,
    pub transport: TransportConfig,
    pub system_prompt_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let [
            openai_api_key,
            openai_endpoint,
            chat_model,
            embedding_model,
            search_api_key,
            search_endpoint,
            index_name,
        ] = require_all(&lookup, REQUIRED_VARS)?;

        require_http_url("OPENAI_ENDPOINT", &openai_endpoint)?;
        require_http_url("SEARCH_ENDPOINT", &search_endpoint)?;

        let defaults = TransportConfig::default();
        let transport = TransportConfig {
            api_version: optional_trimmed(&lookup, "OPENAI_API_VERSION")
                .unwrap_or(defaults.api_version),
            search_api_version: optional_trimmed(&lookup, "SEARCH_API_VERSION")
                .unwrap_or(defaults.search_api_version),
            timeout_ms: parse_u64(&lookup, "OPENAI_TIMEOUT_MS", defaults.timeout_ms)?,
            max_retries: parse_u32(&lookup, "OPENAI_MAX_RETRIES", defaults.max_retries)?,
            retry_base_backoff_ms: parse_u64(
                &lookup,
                "OPENAI_RETRY_BASE_BACKOFF_MS",
                defaults.retry_base_backoff_ms,
            )?,
        };

        Ok(Self {
            chat: ChatConfig {
                chat_endpoint: openai_endpoint,
                api_key: openai_api_key,
                model_deployment_name: chat_model,
            },
            grounding: GroundingConfig {
                search_endpoint,
                index_name,
                api_key: search_api_key,
                embedding_deployment_name: embedding_model,
            },
            transport,
            system_prompt_file: optional_trimmed(&lookup, "SYSTEM_PROMPT_FILE").map(PathBuf::from),
        })
    }
}

/// Loads `.env` from the working directory when one exists.
pub fn load_dotenv() -> Result<(), ConfigError> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(ConfigError::Dotenv(err.to_string())),
    }
}
