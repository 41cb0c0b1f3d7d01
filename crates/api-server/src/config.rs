use std::env;
use std::net::SocketAddr;

use query_engine::{AppConfig, ConfigError};
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Error)]
pub enum ServerConfigError {
    #[error(transparent)]
    App(#[from] ConfigError),
    #[error("API_BIND_ADDR is not a valid socket address: {0}")]
    InvalidBindAddr(String),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub app: AppConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ServerConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServerConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app = AppConfig::from_lookup(&lookup)?;
        let raw_bind_addr = lookup("API_BIND_ADDR")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_bind_addr
            .parse()
            .map_err(|_| ServerConfigError::InvalidBindAddr(raw_bind_addr))?;

        Ok(Self { bind_addr, app })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use query_engine::ConfigError;

    use super::{ServerConfig, ServerConfigError};

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("OPENAI_API_KEY", "chat-secret"),
            ("OPENAI_ENDPOINT", "https://zodiac.openai.azure.com/"),
            ("CHAT_MODEL", "gpt-4o"),
            ("EMBEDDING_MODEL", "text-embedding-ada-002"),
            ("SEARCH_API_KEY", "search-secret"),
            ("SEARCH_ENDPOINT", "https://zodiac.search.windows.net"),
            ("INDEX_NAME", "zodiac-index"),
        ])
    }

    fn config_from(
        vars: &HashMap<&'static str, &'static str>,
    ) -> Result<ServerConfig, ServerConfigError> {
        ServerConfig::from_lookup(|key| vars.get(key).map(|value| value.to_string()))
    }

    #[test]
    fn bind_addr_defaults_to_loopback() {
        let config = config_from(&base_env()).expect("config should load");

        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.app.grounding.index_name, "zodiac-index");
    }

    #[test]
    fn bind_addr_override_is_parsed() {
        let mut vars = base_env();
        vars.insert("API_BIND_ADDR", " 0.0.0.0:9000 ");

        let config = config_from(&vars).expect("config should load");
        assert_eq!(config.bind_addr.port(), 9000);
    }

    #[test]
    fn malformed_bind_addr_is_rejected() {
        let mut vars = base_env();
        vars.insert("API_BIND_ADDR", "localhost");

        let err = config_from(&vars).expect_err("hostname without port should fail");
        assert!(matches!(err, ServerConfigError::InvalidBindAddr(ref raw) if raw == "localhost"));
    }

    #[test]
    fn missing_engine_variables_pass_through() {
        let mut vars = base_env();
        vars.remove("OPENAI_API_KEY");

        let err = config_from(&vars).expect_err("missing key should fail");
        assert!(matches!(
            err,
            ServerConfigError::App(ConfigError::MissingVars(ref missing)) if missing == &["OPENAI_API_KEY".to_string()]
        ));
    }
}
