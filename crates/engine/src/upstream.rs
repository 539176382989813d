use anyhow::Result;
use axum::body::Bytes;
use reqwest::{Client, Response, header::CONTENT_TYPE};
use serde::de::IgnoredAny;
use serde_json::{Value, json};
use tracing::{debug, error, warn};

use crate::api::types::{ChatCompletionPayload, SuggestionRow};
use crate::config::{ChatUpstream, Config, SuggestionsUpstream};
use crate::error::{ApiError, SERVER_ERROR};

/// Outbound side of the proxy: one POST per operation, no retries.
pub struct Upstream {
    client: Client,
    chat: ChatUpstream,
    suggestions: SuggestionsUpstream,
}

impl Upstream {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder().timeout(config.upstream_timeout).build()?;

        Ok(Self {
            client,
            chat: config.chat.clone(),
            suggestions: config.suggestions.clone(),
        })
    }

    /// Sends `messages` to the completions endpoint and relays whatever comes back.
    ///
    /// The returned bytes are JSON: the upstream body untouched when it declared
    /// JSON, otherwise its text wrapped as `{ "error": .. }`.
    pub async fn forward_chat(&self, messages: &Value) -> Result<Bytes, ApiError> {
        let payload = ChatCompletionPayload {
            model: &self.chat.model,
            messages,
        };

        let response = self
            .client
            .post(&self.chat.url)
            .bearer_auth(&self.chat.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| unavailable("chat", e))?;

        let status = response.status();
        let body = read_body(response).await?;

        if !status.is_success() {
            warn!(%status, "Chat upstream returned an error, relaying");
            return Err(ApiError::Upstream { status, body });
        }

        debug!(%status, "Chat upstream answered");
        Ok(body)
    }

    pub async fn forward_suggestion(&self, message: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.suggestions.endpoint())
            .header("apikey", &self.suggestions.api_key)
            .bearer_auth(&self.suggestions.api_key)
            .header("Prefer", "return=minimal")
            .json(&SuggestionRow { message })
            .send()
            .await
            .map_err(|e| unavailable("suggestions", e))?;

        let status = response.status();
        if status.is_success() {
            debug!(%status, "Suggestion stored");
            return Ok(());
        }

        let text = response
            .text()
            .await
            .map_err(|e| unavailable("suggestions", e))?;

        warn!(%status, body = %text, "Suggestions upstream rejected the insert");
        Err(ApiError::UpstreamUnavailable(text))
    }
}

/// JSON when the upstream says so, otherwise the raw text wrapped as `{ "error": .. }`.
async fn read_body(response: Response) -> Result<Bytes, ApiError> {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false);

    if is_json {
        let bytes = response.bytes().await.map_err(|e| unavailable("chat", e))?;
        if let Err(e) = serde_json::from_slice::<IgnoredAny>(&bytes) {
            error!(error = %e, "Chat upstream sent malformed JSON");
            return Err(ApiError::UpstreamUnavailable(SERVER_ERROR.to_string()));
        }
        Ok(bytes)
    } else {
        let text = response.text().await.map_err(|e| unavailable("chat", e))?;
        Ok(Bytes::from(json!({ "error": text }).to_string()))
    }
}

fn unavailable(route: &str, cause: reqwest::Error) -> ApiError {
    error!(route, error = %cause, "Upstream call failed");
    ApiError::UpstreamUnavailable(SERVER_ERROR.to_string())
}
