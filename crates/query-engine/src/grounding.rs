use std::fmt;

use serde::Serialize;

const REDACTED: &str = "<redacted>";

#[derive(Clone, PartialEq, Eq)]
pub struct GroundingConfig {
    pub search_endpoint: String,
    pub index_name: String,
    pub api_key: String,
    pub embedding_deployment_name: String,
}

impl fmt::Debug for GroundingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroundingConfig")
            .field("search_endpoint", &self.search_endpoint)
            .field("index_name", &self.index_name)
            .field("api_key", &REDACTED)
            .field("embedding_deployment_name", &self.embedding_deployment_name)
            .finish()
    }
}

/// Request-time `data_sources` entry pointing the chat service at a vector
/// search index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroundingDescriptor {
    #[serde(rename = "type")]
    pub source_type: DataSourceType,
    pub parameters: SearchParameters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceType {
    AzureSearch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchParameters {
    pub endpoint: String,
    pub index_name: String,
    pub authentication: SearchAuthentication,
    pub query_type: QueryType,
    pub embedding_dependency: EmbeddingDependency,
}

#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchAuthentication {
    ApiKey { key: String },
}

impl fmt::Debug for SearchAuthentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey { .. } => f.debug_struct("ApiKey").field("key", &REDACTED).finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Vector,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmbeddingDependency {
    DeploymentName { deployment_name: String },
}

pub fn build_grounding_descriptor(config: &GroundingConfig) -> GroundingDescriptor {
    GroundingDescriptor {
        source_type: DataSourceType::AzureSearch,
        parameters: SearchParameters {
            endpoint: config.search_endpoint.clone(),
            index_name: config.index_name.clone(),
            authentication: SearchAuthentication::ApiKey {
                key: config.api_key.clone(),
            },
            query_type: QueryType::Vector,
            embedding_dependency: EmbeddingDependency::DeploymentName {
                deployment_name: config.embedding_deployment_name.clone(),
            },
        },
    }
}
