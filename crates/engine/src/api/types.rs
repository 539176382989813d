use serde::Serialize;
use serde_json::Value;

// Outbound body for the completions endpoint
#[derive(Serialize)]
pub struct ChatCompletionPayload<'a> {
    pub model: &'a str,
    pub messages: &'a Value,
}

// Outbound row for the suggestions table
#[derive(Serialize)]
pub struct SuggestionRow<'a> {
    pub message: &'a str,
}
