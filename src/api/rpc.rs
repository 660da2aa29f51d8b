//! Single-shot transport binding: one JSON-RPC message in, one out.
//!
//! Authentication failures answer with a JSON-RPC error body and a 401
//! status, so bridge clients always receive a protocol frame they can
//! forward.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use super::SessionQuery;
use crate::mcp::engine;
use crate::mcp::session::ConnectionContext;
use crate::mcp::types::{error_codes, Frame, RpcResponse};
use crate::{auth, AppState};

pub async fn rpc_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
    body: String,
) -> Response {
    let Some(session_token) = query.session_token else {
        return unauthorized("session_token is required");
    };
    let Some(user_id) = auth::verify_session_token(&state.config.secret_key, &session_token)
    else {
        return unauthorized("Invalid or expired session token");
    };

    let ctx = ConnectionContext {
        user_id,
        session_token,
    };

    match Frame::parse(&body) {
        Ok(frame) => match engine::handle_frame(&state, &ctx, frame).await {
            Some(response) => Json(response).into_response(),
            // Notifications are consumed without a response frame.
            None => StatusCode::ACCEPTED.into_response(),
        },
        Err(e) => Json(RpcResponse::error(
            Value::Null,
            e.code(),
            format!("Parse error: {e}"),
            None,
        ))
        .into_response(),
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(RpcResponse::error(
            Value::Null,
            error_codes::UNAUTHENTICATED,
            message,
            None,
        )),
    )
        .into_response()
}
