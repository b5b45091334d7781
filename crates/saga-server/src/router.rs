use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use saga_mcp::http_transport::{mcp_routes, metadata_routes};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::require_session;
use crate::state::AppState;

/// Assemble every route for `state`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let gate = from_fn_with_state(state.clone(), require_session);

    let mut chat = Router::new().route("/chat", post(handlers::chat));
    if state.auth.is_some() {
        chat = chat.route_layer(gate.clone());
    }

    let mut app = Router::new()
        .route("/health", get(handlers::health))
        .merge(chat);
    if state.auth.is_some() {
        app = app.route("/login", post(handlers::login));
    }

    let mut app = app
        .with_state(state.clone())
        .merge(metadata_routes(state.mcp.clone()));

    if state.mcp_enabled {
        let mut mcp = mcp_routes(state.mcp.clone());
        if state.mcp_gated() {
            mcp = mcp.route_layer(gate);
        }
        app = app.merge(mcp);
    }

    let app = app.layer(TraceLayer::new_for_http());
    if state.cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}
