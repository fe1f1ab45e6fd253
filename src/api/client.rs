//! HTTP client implementing the completion backend against an
//! OpenAI-compatible `chat/completions` endpoint. Non-streaming: one
//! request, one reply.

use async_trait::async_trait;
use tracing::{debug, error};

use crate::api::{ChatMessage, ChatRequest, ChatResponse};
use crate::core::assistant::{CompletionBackend, CompletionError, CompletionInput};

pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl ChatClient {
    pub fn new(base_url: &str, api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Convert backend input into wire messages: the raw transcript travels
/// as-is, a rendered prompt becomes a single user message.
fn to_api_messages(input: CompletionInput) -> Vec<ChatMessage> {
    match input {
        CompletionInput::Messages(messages) => messages
            .into_iter()
            .map(|message| ChatMessage {
                role: message.role.as_str().to_string(),
                content: message.content,
            })
            .collect(),
        CompletionInput::Prompt(prompt) => vec![ChatMessage {
            role: "user".to_string(),
            content: prompt,
        }],
    }
}

/// Pull a human-readable summary out of a provider error body. Providers
/// disagree on shape, so probe the common spots before falling back to
/// the raw text.
fn extract_error_summary(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty error body>".to_string();
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let summary = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(str::to_owned)
            .or_else(|| {
                value.get("error").and_then(|v| match v {
                    serde_json::Value::String(s) => Some(s.clone()),
                    _ => None,
                })
            })
            .or_else(|| {
                value
                    .get("message")
                    .and_then(|v| v.as_str().map(str::to_owned))
            });
        if let Some(summary) = summary {
            let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
            if !collapsed.is_empty() {
                return collapsed;
            }
        }
    }

    trimmed.to_string()
}

#[async_trait]
impl CompletionBackend for ChatClient {
    async fn complete(&self, input: CompletionInput) -> Result<String, CompletionError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: to_api_messages(input),
            stream: false,
        };

        debug!(model = %self.model, messages = request.messages.len(), "sending completion request");

        let mut http_request = self
            .http
            .post(self.endpoint("chat/completions"))
            .header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            http_request = http_request.bearer_auth(key);
        }

        let response = http_request
            .json(&request)
            .send()
            .await
            .map_err(CompletionError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            error!(status = status.as_u16(), "completion request failed");
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message: extract_error_summary(&body),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(CompletionError::Http)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(CompletionError::EmptyResponse)
    }
}
