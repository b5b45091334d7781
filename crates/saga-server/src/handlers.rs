//! Chat, login and health handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, warn};

use crate::error::ApiError;
use crate::middleware::{AuthenticatedSession, CurrentSession};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub session_id: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Some(gate) = state.auth.as_ref() else {
        return Err(ApiError::BadRequest("Authentication is disabled.".to_string()));
    };

    let issued = gate.login(&body.password).map_err(|e| {
        warn!(error = %e, "login rejected");
        ApiError::from(e)
    })?;

    Ok(Json(LoginResponse {
        token: issued.token,
        session_id: issued.session_id,
        expires_at: issued.expires_at,
    }))
}

/// A verified token pins the session; a body id may only repeat it.
/// Without a token the body id is used, or a fresh one.
fn resolve_session_id(
    body: Option<&str>,
    session: Option<&AuthenticatedSession>,
) -> Result<String, ApiError> {
    let requested = body.map(str::trim).filter(|id| !id.is_empty());
    match (requested, session) {
        (Some(id), Some(token)) if id != token.session_id => {
            warn!(user = %token.user, requested = %id, "session id does not match token");
            Err(ApiError::Forbidden(
                "session_id does not match the token's session.".to_string(),
            ))
        }
        (_, Some(token)) => Ok(token.session_id.clone()),
        (Some(id), None) => Ok(id.to_string()),
        (None, None) => Ok(uuid::Uuid::new_v4().to_string()),
    }
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = body.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("message must be non-empty".to_string()));
    }

    let session_id = resolve_session_id(body.session_id.as_deref(), session.as_ref())?;

    let cycle = state.orchestrator.run_cycle(&session_id, message);
    match tokio::time::timeout(state.turn_timeout, cycle).await {
        Ok(Ok(reply)) => Ok(Json(ChatResponse {
            message: reply,
            session_id,
        })),
        Ok(Err(e)) => {
            error!(session_id = %session_id, error = %e, "chat cycle failed");
            Err(ApiError::Internal)
        }
        Err(_) => {
            error!(
                session_id = %session_id,
                timeout_secs = state.turn_timeout.as_secs_f64(),
                "chat cycle timed out"
            );
            Err(ApiError::Timeout)
        }
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
