//! Teamlink — workspace integration gateway.
//!
//! Library crate so the integration suites in `tests/` can exercise the
//! protocol engine, link flow, and stores directly.

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod mcp;
pub mod oauth;
pub mod slack;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use mcp::session::SessionRegistry;
use store::Store;

/// Shared application state passed to handlers.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: config::Config,
    /// Shared outbound HTTP client; per-call timeouts are attached at the
    /// request site.
    pub http: reqwest::Client,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(config: config::Config, store: Arc<dyn Store>) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("failed to build HTTP client");

        Self {
            store,
            config,
            http,
            sessions: SessionRegistry::new(),
        }
    }
}
