pub mod retry;
pub mod schemas;

pub use retry::{RetriesExhausted, RetryPolicy, call_with_retry};
pub use schemas::{
    ChatMessage, ChatRequest, ErrorBody, PingResponse, Role, SuggestionAck, SuggestionRequest,
};
