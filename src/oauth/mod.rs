//! OAuth link flow.
//!
//! `start_link` issues a single-use, time-boxed state and returns the
//! provider authorization URL; `complete_link` validates the state on
//! callback, exchanges the code, and upserts the credential. State
//! consumption and the credential upsert commit atomically. A denied
//! round trip also consumes the state so it cannot be replayed; a failed
//! exchange leaves it unused so the same round trip can be retried.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use rand::RngCore;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::store::{Credential, CredentialUpsert, NewLinkState};
use crate::AppState;

pub const PROVIDER: &str = "slack";

const STATE_TTL_MINUTES: i64 = 10;
const EXCHANGE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(20);

const OAUTH_SCOPES: &[&str] = &[
    "chat:write",
    "channels:history",
    "channels:read",
    "groups:read",
    "users:read",
];

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("unknown or missing OAuth state")]
    InvalidState,

    #[error("OAuth state already consumed")]
    StateAlreadyUsed,

    #[error("OAuth state expired")]
    StateExpired,

    #[error("authorization denied by the provider: {0}")]
    ProviderDenied(String),

    #[error("no authorization code in the callback")]
    MissingCode,

    #[error("token exchange rejected: {0}")]
    ExchangeFailed(String),

    #[error("provider response missing access token or team id")]
    IncompleteProviderResponse,

    #[error("token exchange request failed: {0}")]
    Transport(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// 32 random bytes, URL-safe encoded. Well above the 128-bit floor.
fn new_state_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Persist a fresh link state for the user and return the provider
/// authorization URL to redirect them to. No network call happens here.
pub async fn start_link(state: &AppState, user_id: i64) -> Result<String, LinkError> {
    let token = new_state_token();
    let expires_at = Utc::now() + Duration::minutes(STATE_TTL_MINUTES);

    state
        .store
        .insert_link_state(&NewLinkState {
            state: token.clone(),
            provider: PROVIDER.to_string(),
            user_id,
            expires_at,
        })
        .await?;

    let mut url = Url::parse(&state.config.slack_authorize_url)
        .map_err(|e| LinkError::Internal(e.into()))?;
    url.query_pairs_mut()
        .append_pair("client_id", &state.config.slack_client_id)
        .append_pair("scope", &OAUTH_SCOPES.join(","))
        .append_pair("redirect_uri", &state.config.slack_redirect_uri)
        .append_pair("state", &token);

    tracing::info!(user_id, "link flow started");
    Ok(url.to_string())
}

/// Validate the callback, exchange the code, and store the credential.
pub async fn complete_link(
    state: &AppState,
    state_token: &str,
    code: Option<&str>,
    error: Option<&str>,
) -> Result<Credential, LinkError> {
    let link = state
        .store
        .link_state(state_token)
        .await?
        .ok_or(LinkError::InvalidState)?;

    if link.used {
        return Err(LinkError::StateAlreadyUsed);
    }
    if Utc::now() > link.expires_at {
        return Err(LinkError::StateExpired);
    }

    if let Some(reason) = error {
        // Consume the state: a denied round trip must not be replayable.
        state.store.mark_link_state_used(state_token).await?;
        tracing::warn!(user_id = link.user_id, reason, "link denied by provider");
        return Err(LinkError::ProviderDenied(reason.to_string()));
    }

    let code = code.ok_or(LinkError::MissingCode)?;
    let exchange = exchange_code(state, code).await?;

    if !exchange.ok {
        return Err(LinkError::ExchangeFailed(
            exchange.error.unwrap_or_else(|| "unknown_error".to_string()),
        ));
    }

    let access_token = exchange.access_token.filter(|t| !t.is_empty());
    let team_id = exchange.team.as_ref().and_then(|t| t.id.clone());
    let (Some(access_token), Some(team_id)) = (access_token, team_id) else {
        return Err(LinkError::IncompleteProviderResponse);
    };

    let upsert = CredentialUpsert {
        user_id: link.user_id,
        team_id,
        team_name: exchange.team.and_then(|t| t.name),
        access_token,
        scope: exchange.scope.unwrap_or_default(),
        authed_user_id: exchange.authed_user.and_then(|u| u.id),
    };

    // Mark-used and upsert commit together or not at all.
    let credential = state.store.finalize_link(state_token, &upsert).await?;

    tracing::info!(
        user_id = credential.user_id,
        team_id = %credential.team_id,
        "workspace linked"
    );
    Ok(credential)
}

#[derive(Debug, Deserialize)]
struct ExchangeResponse {
    #[serde(default)]
    ok: bool,
    error: Option<String>,
    access_token: Option<String>,
    scope: Option<String>,
    team: Option<ExchangeTeam>,
    authed_user: Option<ExchangeAuthedUser>,
}

#[derive(Debug, Deserialize)]
struct ExchangeTeam {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExchangeAuthedUser {
    id: Option<String>,
}

async fn exchange_code(state: &AppState, code: &str) -> Result<ExchangeResponse, LinkError> {
    let url = format!("{}/oauth.v2.access", state.config.slack_api_base);

    let resp = state
        .http
        .post(&url)
        .timeout(EXCHANGE_TIMEOUT)
        .form(&[
            ("client_id", state.config.slack_client_id.as_str()),
            ("client_secret", state.config.slack_client_secret.as_str()),
            ("code", code),
            ("redirect_uri", state.config.slack_redirect_uri.as_str()),
        ])
        .send()
        .await
        .map_err(|e| LinkError::Transport(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(LinkError::Transport(format!(
            "token endpoint returned {status}"
        )));
    }

    resp.json::<ExchangeResponse>()
        .await
        .map_err(|e| LinkError::Transport(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_tokens_are_long_and_unique() {
        let a = new_state_token();
        let b = new_state_token();
        assert_ne!(a, b);
        // 32 bytes -> 43 chars of URL-safe base64 without padding.
        assert_eq!(a.len(), 43);
        assert!(!a.contains('+') && !a.contains('/') && !a.contains('='));
    }
}
