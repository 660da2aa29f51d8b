//! SSE transport binding: a server-push stream paired with a submission
//! endpoint.
//!
//! The stream side opens the session, registers it, and first emits an
//! `endpoint` event telling the client where to POST its frames. Responses
//! flow back over the stream as `message` events. The registry entry is
//! removed when the stream is dropped.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use super::SessionQuery;
use crate::errors::AppError;
use crate::mcp::engine;
use crate::mcp::session::{ConnectionContext, SessionRegistry, SseSession};
use crate::mcp::types::{Frame, RpcResponse};
use crate::{auth, AppState};

const OUTBOUND_BUFFER: usize = 32;

/// Removes the session from the registry when the stream is dropped.
struct SessionGuard {
    registry: SessionRegistry,
    id: Uuid,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.remove(&self.id);
        tracing::info!(session_id = %self.id, "sse session closed");
    }
}

pub async fn sse_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let user_id = query
        .session_token
        .as_deref()
        .and_then(|token| auth::verify_session_token(&state.config.secret_key, token))
        .ok_or(AppError::Unauthorized)?;

    let ctx = ConnectionContext {
        user_id,
        session_token: query.session_token.unwrap_or_default(),
    };

    let session_id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel::<RpcResponse>(OUTBOUND_BUFFER);
    state.sessions.insert(session_id, SseSession::new(ctx, tx));
    tracing::info!(user_id, session_id = %session_id, "sse session established");

    let guard = SessionGuard {
        registry: state.sessions.clone(),
        id: session_id,
    };

    let endpoint = format!("/mcp/messages?session_id={session_id}");
    let handshake = stream::once(async move {
        Ok::<_, Infallible>(Event::default().event("endpoint").data(endpoint))
    });

    // The guard moves into the closure, so the registry entry lives exactly
    // as long as the stream.
    let responses = ReceiverStream::new(rx).map(move |response| {
        let _keep = &guard;
        let data = serde_json::to_string(&response).unwrap_or_default();
        Ok::<_, Infallible>(Event::default().event("message").data(data))
    });

    Ok(Sse::new(handshake.chain(responses)).keep_alive(KeepAlive::default()))
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub session_id: Uuid,
}

/// Write side of the SSE pair. Frames are accepted here and answered on the
/// session's stream; the POST itself only acknowledges receipt.
pub async fn messages_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MessagesQuery>,
    body: String,
) -> impl IntoResponse {
    let Some(session) = state.sessions.get(&query.session_id) else {
        return (StatusCode::NOT_FOUND, "unknown session");
    };

    let reply = match Frame::parse(&body) {
        Ok(frame) => {
            // Hold the gate across dispatch so messages on one session are
            // handled strictly in order.
            let _gate = session.gate.lock().await;
            engine::handle_frame(&state, &session.ctx, frame).await
        }
        Err(e) => Some(RpcResponse::error(
            serde_json::Value::Null,
            e.code(),
            e.to_string(),
            None,
        )),
    };

    if let Some(response) = reply {
        // A full or closed channel means the stream side is gone; the result
        // is dropped, matching disconnect semantics.
        let _ = session.tx.send(response).await;
    }

    (StatusCode::ACCEPTED, "accepted")
}
