use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::oauth::LinkError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid or missing session token")]
    Unauthorized,

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "invalid_session_token",
                "invalid or missing session token".to_string(),
            ),
            AppError::Link(e) => match e {
                LinkError::InvalidState => (
                    StatusCode::BAD_REQUEST,
                    "link_state_error",
                    "invalid_state",
                    "unknown or missing OAuth state".to_string(),
                ),
                LinkError::StateAlreadyUsed => (
                    StatusCode::BAD_REQUEST,
                    "link_state_error",
                    "state_already_used",
                    "this OAuth state has already been consumed".to_string(),
                ),
                LinkError::StateExpired => (
                    StatusCode::BAD_REQUEST,
                    "link_state_error",
                    "state_expired",
                    "the OAuth state has expired, restart the link flow".to_string(),
                ),
                LinkError::ProviderDenied(reason) => (
                    StatusCode::BAD_REQUEST,
                    "provider_exchange_error",
                    "provider_denied",
                    format!("workspace authorization denied: {}", reason),
                ),
                LinkError::MissingCode => (
                    StatusCode::BAD_REQUEST,
                    "link_state_error",
                    "missing_code",
                    "no authorization code in the provider callback".to_string(),
                ),
                LinkError::ExchangeFailed(reason) => (
                    StatusCode::BAD_REQUEST,
                    "provider_exchange_error",
                    "exchange_failed",
                    format!("token exchange failed: {}", reason),
                ),
                LinkError::IncompleteProviderResponse => (
                    StatusCode::BAD_REQUEST,
                    "provider_exchange_error",
                    "incomplete_provider_response",
                    "provider response is missing the access token or team id".to_string(),
                ),
                LinkError::Transport(detail) => (
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    "exchange_unreachable",
                    format!("token exchange request failed: {}", detail),
                ),
                LinkError::Internal(e) => {
                    tracing::error!("link flow internal error: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal_error",
                        "internal_server_error",
                        "internal server error".to_string(),
                    )
                }
            },
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}
