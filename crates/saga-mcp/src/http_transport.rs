//! HTTP transport for MCP server.
//!
//! JSON-RPC requests are posted to `/mcp`; `GET /` returns server metadata.
//! The routes are returned unlayered so the caller can put `/mcp` behind its
//! own authentication.

use crate::protocol::JsonRpcResponse;
use crate::server::McpServer;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;

/// Routes serving JSON-RPC at `/mcp`.
pub fn mcp_routes(server: Arc<McpServer>) -> Router {
    Router::new()
        .route("/mcp", post(handle_mcp_post))
        .with_state(server)
}

/// Route serving metadata at `/`.
pub fn metadata_routes(server: Arc<McpServer>) -> Router {
    Router::new()
        .route("/", get(handle_metadata))
        .with_state(server)
}

/// Create the full MCP router (no authentication).
pub fn create_router(server: Arc<McpServer>) -> Router {
    mcp_routes(server.clone()).merge(metadata_routes(server))
}

/// Handle POST requests to /mcp (JSON-RPC over HTTP).
///
/// The body is taken as text so malformed JSON still gets a JSON-RPC error.
async fn handle_mcp_post(State(server): State<Arc<McpServer>>, body: String) -> Response {
    match server.handle_message(&body).await {
        Some(response) => (StatusCode::OK, Json::<JsonRpcResponse>(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn handle_metadata(State(server): State<Arc<McpServer>>) -> impl IntoResponse {
    Json(server.metadata())
}
