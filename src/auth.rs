//! Session-token verification.
//!
//! The gateway never runs a login flow itself — callers arrive with an opaque
//! signed session token minted by the account service (or by
//! `teamlink session` during development). `verify_session_token` is the only
//! entry point the transports use.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Mint a signed session token for a user id. Development/CLI use only.
pub fn issue_session_token(secret: &str, user_id: i64, ttl_minutes: i64) -> anyhow::Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::minutes(ttl_minutes)).timestamp(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Decode a session token and return the user id if valid, else None.
/// Expired, tampered, or malformed tokens all resolve to None.
pub fn verify_session_token(secret: &str, token: &str) -> Option<i64> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()?;
    data.claims.sub.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let token = issue_session_token("test-secret", 42, 60).unwrap();
        assert_eq!(verify_session_token("test-secret", &token), Some(42));
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = issue_session_token("test-secret", 42, 60).unwrap();
        assert_eq!(verify_session_token("other-secret", &token), None);
    }

    #[test]
    fn expired_token_rejected() {
        let token = issue_session_token("test-secret", 42, -5).unwrap();
        assert_eq!(verify_session_token("test-secret", &token), None);
    }

    #[test]
    fn garbage_rejected() {
        assert_eq!(verify_session_token("test-secret", "not-a-token"), None);
    }
}
