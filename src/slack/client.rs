//! Workspace API client.
//!
//! All three data calls share one request primitive: a form-encoded POST
//! authenticated with the credential as a bearer token. The provider reports
//! its own failures with `ok: false` inside an HTTP 200 body, so provider
//! errors and transport errors are kept distinct.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

use super::{ChannelList, HistoryList, SendResult};

const API_TIMEOUT: Duration = Duration::from_secs(20);

pub const DEFAULT_CHANNEL_LIMIT: u32 = 20;
pub const DEFAULT_HISTORY_LIMIT: u32 = 10;

/// Hard ceiling the provider enforces on history pages.
pub const HISTORY_LIMIT_CEILING: u32 = 100;

#[derive(Debug, Error)]
pub enum SlackError {
    /// The provider answered but rejected the call (`ok: false`). Carries the
    /// provider's error code, e.g. `channel_not_found`.
    #[error("workspace API error: {0}")]
    Provider(String),

    /// The call never produced a usable provider response: timeout,
    /// connection failure, non-2xx status, or an unparseable body.
    #[error("workspace request failed: {0}")]
    Transport(String),
}

pub struct SlackClient {
    http: Client,
    base_url: String,
    token: String,
}

impl SlackClient {
    pub fn new(http: Client, base_url: &str, token: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    async fn call(&self, endpoint: &str, form: Vec<(&'static str, String)>) -> Result<Value, SlackError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let resp = self
            .http
            .post(&url)
            .timeout(API_TIMEOUT)
            .bearer_auth(&self.token)
            .form(&form)
            .send()
            .await
            .map_err(|e| SlackError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SlackError::Transport(format!(
                "workspace API returned {status}"
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| SlackError::Transport(e.to_string()))?;

        if !body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            let code = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error");
            return Err(SlackError::Provider(code.to_string()));
        }

        Ok(body)
    }

    pub async fn list_channels(
        &self,
        limit: u32,
        include_private: bool,
    ) -> Result<ChannelList, SlackError> {
        let mut types = vec!["public_channel"];
        if include_private {
            types.push("private_channel");
        }

        let body = self
            .call(
                "conversations.list",
                vec![
                    ("limit", limit.to_string()),
                    ("types", types.join(",")),
                ],
            )
            .await?;

        Ok(ChannelList::from_api(&body))
    }

    pub async fn send_message(
        &self,
        channel_id: &str,
        text: &str,
        thread_ts: Option<&str>,
        reply_broadcast: bool,
    ) -> Result<SendResult, SlackError> {
        let mut form = vec![
            ("channel", channel_id.to_string()),
            ("text", text.to_string()),
        ];
        if let Some(ts) = thread_ts {
            form.push(("thread_ts", ts.to_string()));
        }
        if reply_broadcast {
            form.push(("reply_broadcast", "true".to_string()));
        }

        let body = self.call("chat.postMessage", form).await?;
        Ok(SendResult::from_api(&body))
    }

    pub async fn fetch_history(
        &self,
        channel_id: &str,
        limit: u32,
    ) -> Result<HistoryList, SlackError> {
        let limit = limit.min(HISTORY_LIMIT_CEILING);

        let body = self
            .call(
                "conversations.history",
                vec![
                    ("channel", channel_id.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        Ok(HistoryList::from_api(&body))
    }
}
