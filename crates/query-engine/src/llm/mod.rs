pub mod azure_openai;
pub mod connectivity;
pub mod observability;
pub mod transport;

pub use azure_openai::{AzureOpenAiSetupError, AzureOpenAiTransport};
pub use connectivity::{CONNECTION_CHECK_PROMPT, SearchIndexProbe, check_chat_connection};
pub use observability::{TransportTelemetry, complete_with_telemetry, log_telemetry};
pub use transport::{
    ChatChoice, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatTransport,
    ChatTransportFuture, TokenUsage, TransportError,
};
