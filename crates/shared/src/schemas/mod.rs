use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

// POST /chat
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

// POST /submit-suggestion
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SuggestionRequest {
    pub message: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SuggestionAck {
    pub success: bool,
}

// GET /ping
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PingResponse {
    pub ok: bool,
    pub ts: u64,
}

/// Body of every error the proxy generates itself.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}
