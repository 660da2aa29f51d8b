pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A pending OAuth round trip. Rows are never deleted — a consumed state is
/// flipped to `used` and kept for audit.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct LinkState {
    pub state: String,
    pub provider: String,
    pub user_id: i64,
    pub used: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLinkState {
    pub state: String,
    pub provider: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// A linked workspace credential, unique per (user_id, team_id).
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Credential {
    pub user_id: i64,
    pub team_id: String,
    pub team_name: Option<String>,
    pub access_token: String,
    pub scope: String,
    pub authed_user_id: Option<String>,
    pub status: String,
    pub installed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CredentialUpsert {
    pub user_id: i64,
    pub team_id: String,
    pub team_name: Option<String>,
    pub access_token: String,
    pub scope: String,
    pub authed_user_id: Option<String>,
}

/// Abstraction over the link-state and credential tables.
/// Implementations: PgStore (production), MemoryStore (tests, credential-less
/// dev runs).
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_link_state(&self, state: &NewLinkState) -> anyhow::Result<()>;

    async fn link_state(&self, token: &str) -> anyhow::Result<Option<LinkState>>;

    async fn mark_link_state_used(&self, token: &str) -> anyhow::Result<()>;

    /// Insert or update the credential for (user_id, team_id). Re-linking the
    /// same team updates the row in place; `status` is forced back to active.
    async fn upsert_credential(&self, upsert: &CredentialUpsert) -> anyhow::Result<Credential>;

    /// Mark the link state used and upsert the credential in one atomic step.
    /// Either both changes persist or neither does.
    async fn finalize_link(
        &self,
        state_token: &str,
        upsert: &CredentialUpsert,
    ) -> anyhow::Result<Credential>;

    /// The most recently installed active credential for a user. When several
    /// teams are linked the latest `installed_at` wins.
    async fn active_credential(&self, user_id: i64) -> anyhow::Result<Option<Credential>>;
}
