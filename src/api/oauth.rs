//! OAuth redirect endpoints and the connect-link discovery endpoint.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::SessionQuery;
use crate::errors::AppError;
use crate::{auth, oauth, AppState};

fn require_user(state: &AppState, query: &SessionQuery) -> Result<(i64, String), AppError> {
    let token = query.session_token.clone().ok_or(AppError::Unauthorized)?;
    let user_id = auth::verify_session_token(&state.config.secret_key, &token)
        .ok_or(AppError::Unauthorized)?;
    Ok((user_id, token))
}

/// GET /oauth/slack/start — begin the link flow and redirect to the provider.
pub async fn start(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> Result<Redirect, AppError> {
    let (user_id, _) = require_user(&state, &query)?;
    let url = oauth::start_link(&state, user_id).await?;
    Ok(Redirect::temporary(&url))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// GET /oauth/slack/callback — the provider redirects here after the user
/// approves or denies.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<Value>, AppError> {
    // An absent state never matches a stored one, so it surfaces as
    // InvalidState through the normal path.
    let state_token = query.state.as_deref().unwrap_or_default();
    let credential = oauth::complete_link(
        &state,
        state_token,
        query.code.as_deref(),
        query.error.as_deref(),
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Workspace connected successfully",
        "team_id": credential.team_id,
        "team_name": credential.team_name,
    })))
}

/// GET /connect/start — authenticated discovery of the link URL, for clients
/// that want to show it without starting the redirect themselves.
pub async fn connect_start(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<Value>, AppError> {
    let (user_id, token) = require_user(&state, &query)?;
    let connect_url = format!(
        "{}/oauth/slack/start?session_token={}",
        state.config.public_url, token
    );
    Ok(Json(json!({
        "user_id": user_id,
        "connect_url": connect_url,
    })))
}
