pub mod config;
mod config_env;
pub mod conversation;
pub mod formatter;
pub mod grounding;
pub mod llm;
pub mod orchestrator;
pub mod persona;

pub use config::{AppConfig, ChatConfig, ConfigError, TransportConfig, load_dotenv};
pub use conversation::{ConversationError, ConversationStore, Role, Turn};
pub use formatter::{Citation, format_response};
pub use grounding::{GroundingConfig, GroundingDescriptor, build_grounding_descriptor};
pub use orchestrator::{ExchangeState, OrchestratorError, QueryOrchestrator};
pub use persona::{DEFAULT_SYSTEM_PROMPT, EXAMPLE_QUESTIONS, resolve_system_prompt};
