use query_engine::Turn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub turns: Vec<Turn>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub turns: Vec<Turn>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExamplesResponse {
    pub questions: Vec<String>,
}
