//! Web adapter: one chat endpoint plus a minimal embedded front end.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::error::Error;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::commands;
use crate::core::assistant::Assistant;

/// One assistant shared by all requests, serialized behind a mutex: the
/// lock is held across the whole turn so the completion call can never
/// interleave with another mutation.
pub type SharedAssistant = Arc<Mutex<Assistant>>;

#[derive(Deserialize)]
pub struct ChatTurnRequest {
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
pub struct ChatTurnResponse {
    message: String,
    mode: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.status.as_u16(),
                "message": self.message,
            }
        }));
        (self.status, body).into_response()
    }
}

pub fn build_router(assistant: SharedAssistant) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .with_state(assistant)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> &'static str {
    "OK"
}

async fn chat(
    State(assistant): State<SharedAssistant>,
    Json(request): Json<ChatTurnRequest>,
) -> Result<Json<ChatTurnResponse>, ApiError> {
    let text = request.message.trim().to_string();
    if text.is_empty() {
        return Err(ApiError::bad_request("message must not be empty"));
    }

    let mut assistant = assistant.lock().await;

    let message = if text.starts_with('/') {
        commands::process_web_command(&mut assistant, &text)
    } else {
        assistant.respond(&text).await.map_err(|e| {
            error!(error = %e, "completion failed");
            ApiError::internal(e.to_string())
        })?
    };

    Ok(Json(ChatTurnResponse {
        message,
        mode: assistant.mode().to_string(),
    }))
}

/// Serve the chat endpoint until the process is stopped.
pub async fn run(assistant: Assistant, addr: &str) -> Result<(), Box<dyn Error>> {
    let shared: SharedAssistant = Arc::new(Mutex::new(assistant));
    let app = build_router(shared);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("web chat listening on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Parley</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }
  #messages { border: 1px solid #ccc; border-radius: 6px; padding: 1rem; min-height: 18rem; }
  .user { color: #056; margin: .4rem 0; }
  .assistant { color: #222; margin: .4rem 0; }
  .system { color: #777; font-style: italic; margin: .4rem 0; }
  form { display: flex; gap: .5rem; margin-top: 1rem; }
  input[type=text] { flex: 1; padding: .5rem; }
  #mode { color: #777; font-size: .85rem; }
</style>
</head>
<body>
<h1>Parley</h1>
<p id="mode">mode: &mdash;</p>
<div id="messages"></div>
<form id="chat-form">
  <input type="text" id="input" placeholder="Say something, or /clear, /mode, /status" autocomplete="off" autofocus>
  <button type="submit">Send</button>
</form>
<script>
  const messages = document.getElementById('messages');
  const input = document.getElementById('input');
  const mode = document.getElementById('mode');

  function addLine(text, cls) {
    const div = document.createElement('div');
    div.className = cls;
    div.textContent = text;
    messages.appendChild(div);
    messages.scrollTop = messages.scrollHeight;
  }

  document.getElementById('chat-form').addEventListener('submit', async (e) => {
    e.preventDefault();
    const text = input.value.trim();
    if (!text) return;
    input.value = '';
    addLine(text, text.startsWith('/') ? 'system' : 'user');

    const response = await fetch('/api/chat', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ message: text }),
    });
    const data = await response.json();
    if (!response.ok) {
      addLine('Error: ' + (data.error ? data.error.message : response.statusText), 'system');
      return;
    }
    addLine(data.message, text.startsWith('/') ? 'system' : 'assistant');
    mode.textContent = 'mode: ' + data.mode;
  });
</script>
</body>
</html>
"#;
