// HTTP surface: the chat endpoint the widget posts to and a diagnostic
// endpoint reporting whether a hosted-model credential is configured.

use crate::conversation::Message;
use crate::error::{Error, Result};
use crate::router::{FALLBACK_REPLY, ResponseEnvelope, ResponseSource, Router};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

pub struct AppState {
    pub router: Router,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Provider label as the widget expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Local,
    Groq,
    Error,
}

impl From<ResponseSource> for Provider {
    fn from(source: ResponseSource) -> Self {
        match source {
            ResponseSource::Local => Self::Local,
            ResponseSource::Remote => Self::Groq,
            ResponseSource::Error => Self::Error,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    pub provider: Provider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl From<ResponseEnvelope> for ChatReply {
    fn from(envelope: ResponseEnvelope) -> Self {
        Self {
            reply: envelope.text,
            provider: envelope.source.into(),
            model: envelope.model_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvCheck {
    pub has_credential: bool,
    pub credential_preview: Option<String>,
}

impl EnvCheck {
    pub fn for_credential(credential: Option<&str>) -> Self {
        Self {
            has_credential: credential.is_some(),
            credential_preview: credential.map(credential_preview),
        }
    }
}

/// First 5 and last 2 characters around an ellipsis. Keys too short to
/// hide anything that way are shown as the ellipsis alone.
pub fn credential_preview(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() < 8 {
        return "…".into();
    }
    let head: String = chars[..5].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}…{tail}")
}

pub fn app(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/api/chat", post(chat))
        .route("/api/env-check", get(env_check))
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn serve(bind: &str, state: Arc<AppState>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(Error::from)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

/// `POST /api/chat`. Remote exhaustion and setup failures answer 502; an
/// unreadable body answers 200 with the fallback reply.
pub async fn chat(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request: ChatRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            warn!("unreadable chat request: {e}");
            let reply = ChatReply::from(ResponseEnvelope::local(FALLBACK_REPLY));
            return (StatusCode::OK, Json(reply)).into_response();
        }
    };

    let envelope = state.router.route(request.messages).await;
    let status = match envelope.source {
        ResponseSource::Error => StatusCode::BAD_GATEWAY,
        ResponseSource::Local | ResponseSource::Remote => StatusCode::OK,
    };
    (status, Json(ChatReply::from(envelope))).into_response()
}

/// `GET /api/env-check`.
pub async fn env_check(State(state): State<Arc<AppState>>) -> Json<EnvCheck> {
    Json(EnvCheck::for_credential(state.router.credential()))
}
