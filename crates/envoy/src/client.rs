use anyhow::{Result, anyhow, bail};
use relay_shared::{
    ChatMessage, ChatRequest, ErrorBody, PingResponse, RetryPolicy, SuggestionRequest,
    call_with_retry,
};
use reqwest::{Response, header::CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(base_url: String, retry: RetryPolicy) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        }
    }

    /// Warm-up probe; a cold proxy is expected to fail this, so no retry.
    pub async fn ping(&self) -> Result<PingResponse> {
        let url = format!("{}/ping", self.base_url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            bail!("/ping returned {}", response.status());
        }

        Ok(response.json::<PingResponse>().await?)
    }

    /// Sends the whole conversation and returns the assistant's reply text.
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatRequest {
            messages: messages.to_vec(),
        };

        let response = self.post_with_retry("/chat", &request).await?;
        let status = response.status();

        let content_type = content_type(&response);
        if !content_type.contains("application/json") {
            let text = response.text().await?;
            bail!(
                "Expected JSON, got {status} ({content_type}). Body: {}",
                prefix(&text, 300)
            );
        }

        let data = response.json::<Value>().await?;

        if !status.is_success() {
            bail!("Backend error {}: {}", status.as_u16(), error_detail(&data));
        }

        first_choice(&data).ok_or_else(|| anyhow!("No response from backend"))
    }

    pub async fn submit_suggestion(&self, message: &str) -> Result<()> {
        let request = SuggestionRequest {
            message: message.to_string(),
        };

        let response = self.post_with_retry("/submit-suggestion", &request).await?;
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }

        let text = response.text().await?;
        let detail = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);

        bail!("Suggestion failed ({}): {}", status.as_u16(), detail)
    }

    /// Retries only when no response arrived; error statuses come straight back.
    async fn post_with_retry<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);

        let response = call_with_retry(&self.retry, |_attempt| {
            self.client.post(&url).json(body).send()
        })
        .await?;

        Ok(response)
    }
}

fn content_type(response: &Response) -> String {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

fn first_choice(data: &Value) -> Option<String> {
    data.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn error_detail(data: &Value) -> String {
    let detail = data
        .get("error")
        .or_else(|| data.get("message"))
        .map(|field| match field {
            Value::String(text) => Some(text.clone()),
            Value::Object(inner) => inner.get("message").and_then(Value::as_str).map(str::to_string),
            _ => None,
        });

    match detail {
        Some(Some(text)) => text,
        _ => prefix(&data.to_string(), 200),
    }
}

fn prefix(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
