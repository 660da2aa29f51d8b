//! WebSocket transport binding.
//!
//! One handler task per connection; the read loop processes frames strictly
//! in order, so a session never has two messages in flight. An invalid
//! session credential closes the socket with a policy-violation code before
//! any frame is read.

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use serde_json::Value;

use super::SessionQuery;
use crate::mcp::engine;
use crate::mcp::session::ConnectionContext;
use crate::mcp::types::{Frame, RpcResponse, ServerNotification};
use crate::{auth, AppState};

const POLICY_VIOLATION: u16 = 1008;

pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(state, query.session_token, socket))
}

async fn handle_socket(state: Arc<AppState>, session_token: Option<String>, mut socket: WebSocket) {
    let user_id = session_token
        .as_deref()
        .and_then(|token| auth::verify_session_token(&state.config.secret_key, token));

    let Some(user_id) = user_id else {
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: POLICY_VIOLATION,
                reason: "invalid session token".into(),
            })))
            .await;
        return;
    };

    let ctx = ConnectionContext {
        user_id,
        session_token: session_token.unwrap_or_default(),
    };
    tracing::info!(user_id, "websocket session established");

    let welcome = ServerNotification::connected(user_id);
    if send_json(&mut socket, &welcome).await.is_err() {
        return;
    }

    while let Some(inbound) = socket.recv().await {
        let message = match inbound {
            Ok(message) => message,
            Err(_) => break,
        };

        match message {
            Message::Text(raw) => {
                let reply = match Frame::parse(&raw) {
                    Ok(frame) => engine::handle_frame(&state, &ctx, frame).await,
                    Err(e) => Some(RpcResponse::error(
                        Value::Null,
                        e.code(),
                        e.to_string(),
                        None,
                    )),
                };
                if let Some(response) = reply {
                    if send_json(&mut socket, &response).await.is_err() {
                        break;
                    }
                }
            }
            Message::Close(_) => break,
            // axum answers pings itself; binary frames are not part of this
            // protocol and are ignored.
            Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => {}
        }
    }

    tracing::info!(user_id, "websocket session closed");
}

async fn send_json<T: serde::Serialize>(socket: &mut WebSocket, payload: &T) -> Result<(), ()> {
    let raw = serde_json::to_string(payload).map_err(|_| ())?;
    socket.send(Message::Text(raw)).await.map_err(|_| ())
}
