//! In-memory Store backend.
//!
//! Keeps link states and credentials in process memory. Used by the test
//! suites and by `teamlink serve --memory` when no database is available;
//! everything is lost on restart.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::{Credential, CredentialUpsert, LinkState, NewLinkState, Store};

#[derive(Default)]
struct Inner {
    states: HashMap<String, LinkState>,
    credentials: Vec<Credential>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every credential row, used by tests to assert row counts.
    pub fn all_credentials(&self) -> Vec<Credential> {
        self.inner.lock().expect("store lock poisoned").credentials.clone()
    }
}

fn apply_upsert(inner: &mut Inner, upsert: &CredentialUpsert) -> Credential {
    let now = Utc::now();
    if let Some(existing) = inner
        .credentials
        .iter_mut()
        .find(|c| c.user_id == upsert.user_id && c.team_id == upsert.team_id)
    {
        existing.team_name = upsert.team_name.clone();
        existing.access_token = upsert.access_token.clone();
        existing.scope = upsert.scope.clone();
        existing.authed_user_id = upsert.authed_user_id.clone();
        existing.status = "active".into();
        existing.updated_at = now;
        return existing.clone();
    }
    let cred = Credential {
        user_id: upsert.user_id,
        team_id: upsert.team_id.clone(),
        team_name: upsert.team_name.clone(),
        access_token: upsert.access_token.clone(),
        scope: upsert.scope.clone(),
        authed_user_id: upsert.authed_user_id.clone(),
        status: "active".into(),
        installed_at: now,
        updated_at: now,
    };
    inner.credentials.push(cred.clone());
    cred
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_link_state(&self, state: &NewLinkState) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        anyhow::ensure!(
            !inner.states.contains_key(&state.state),
            "duplicate link state token"
        );
        inner.states.insert(
            state.state.clone(),
            LinkState {
                state: state.state.clone(),
                provider: state.provider.clone(),
                user_id: state.user_id,
                used: false,
                created_at: Utc::now(),
                expires_at: state.expires_at,
            },
        );
        Ok(())
    }

    async fn link_state(&self, token: &str) -> anyhow::Result<Option<LinkState>> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner.states.get(token).cloned())
    }

    async fn mark_link_state_used(&self, token: &str) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        if let Some(state) = inner.states.get_mut(token) {
            state.used = true;
        }
        Ok(())
    }

    async fn upsert_credential(&self, upsert: &CredentialUpsert) -> anyhow::Result<Credential> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        Ok(apply_upsert(&mut inner, upsert))
    }

    async fn finalize_link(
        &self,
        state_token: &str,
        upsert: &CredentialUpsert,
    ) -> anyhow::Result<Credential> {
        // Single lock acquisition stands in for the SQL transaction.
        let mut inner = self.inner.lock().expect("store lock poisoned");
        if let Some(state) = inner.states.get_mut(state_token) {
            state.used = true;
        }
        Ok(apply_upsert(&mut inner, upsert))
    }

    async fn active_credential(&self, user_id: i64) -> anyhow::Result<Option<Credential>> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner
            .credentials
            .iter()
            .filter(|c| c.user_id == user_id && c.status == "active")
            .max_by_key(|c| c.installed_at)
            .cloned())
    }
}
