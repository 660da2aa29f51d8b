use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::AppState;

pub mod oauth;
pub mod rpc;
pub mod sse;
pub mod ws;

/// Session credential carried as a query parameter by every transport.
#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session_token: Option<String>,
}

/// Build the gateway router. Every MCP transport feeds the same dispatch in
/// `mcp::engine`; the routes differ only in how frames arrive and leave.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/mcp/ws", get(ws::ws_handler))
        .route("/mcp/sse", get(sse::sse_handler))
        .route("/mcp/messages", post(sse::messages_handler))
        .route("/mcp/http", post(rpc::rpc_handler))
        .route("/oauth/slack/start", get(oauth::start))
        .route("/oauth/slack/callback", get(oauth::callback))
        .route("/connect/start", get(oauth::connect_start))
        .with_state(state)
}
