//! Per-connection state.
//!
//! The WebSocket and single-shot transports keep their `ConnectionContext`
//! as a local owned by the handler task, so no shared map is needed there.
//! The SSE transport is split across a read-side stream and a write-side
//! submission endpoint, so it is the one place that genuinely needs a
//! registry mapping session ids to live sessions.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use super::types::RpcResponse;

/// Identity resolved once at transport-session establishment. Every message
/// on the session is pre-authenticated through this context; it is dropped
/// when the transport closes.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub user_id: i64,
    /// The opaque session token the caller presented, kept only to embed in
    /// connect URLs returned to unlinked callers.
    pub session_token: String,
}

/// One live SSE session: the stream side drains `tx`, the submission
/// endpoint feeds it.
pub struct SseSession {
    pub ctx: ConnectionContext,
    pub tx: mpsc::Sender<RpcResponse>,
    /// Serializes message handling within this session so responses keep
    /// per-connection ordering. Sessions never share a gate.
    pub gate: Mutex<()>,
}

impl SseSession {
    pub fn new(ctx: ConnectionContext, tx: mpsc::Sender<RpcResponse>) -> Arc<Self> {
        Arc::new(Self {
            ctx,
            tx,
            gate: Mutex::new(()),
        })
    }
}

/// Concurrent registry of live SSE sessions. Insertion on connect, removal
/// on disconnect; lookups from the submission endpoint.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<DashMap<Uuid, Arc<SseSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: Uuid, session: Arc<SseSession>) {
        self.inner.insert(id, session);
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<SseSession>> {
        self.inner.get(id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, id: &Uuid) {
        self.inner.remove(id);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registry_insert_lookup_remove() {
        let registry = SessionRegistry::new();
        let (tx, _rx) = mpsc::channel(4);
        let ctx = ConnectionContext {
            user_id: 7,
            session_token: "tok".into(),
        };

        let id = Uuid::new_v4();
        registry.insert(id, SseSession::new(ctx, tx));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&id).unwrap().ctx.user_id, 7);

        registry.remove(&id);
        assert!(registry.is_empty());
        assert!(registry.get(&id).is_none());
    }
}
