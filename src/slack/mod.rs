//! Normalized workspace API payloads.
//!
//! The provider's raw response bodies are reshaped here into the stable
//! structures tool results expose, so callers never see provider field names
//! like `num_members` or the nested `message` object.

pub mod client;

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct ChannelEntry {
    pub id: Option<String>,
    pub name: Option<String>,
    pub is_private: bool,
    pub member_count: Option<i64>,
}

impl ChannelEntry {
    fn from_api(channel: &Value) -> Self {
        Self {
            id: channel.get("id").and_then(Value::as_str).map(str::to_string),
            name: channel.get("name").and_then(Value::as_str).map(str::to_string),
            is_private: channel
                .get("is_private")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            member_count: channel.get("num_members").and_then(Value::as_i64),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelList {
    pub channels: Vec<ChannelEntry>,
    pub next_cursor: Option<String>,
}

impl ChannelList {
    pub fn from_api(body: &Value) -> Self {
        let channels = body
            .get("channels")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().map(ChannelEntry::from_api).collect())
            .unwrap_or_default();

        // The provider signals "no more pages" with an empty cursor string.
        let next_cursor = body
            .pointer("/response_metadata/next_cursor")
            .and_then(Value::as_str)
            .filter(|cursor| !cursor.is_empty())
            .map(str::to_string);

        Self {
            channels,
            next_cursor,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendResult {
    pub ok: bool,
    pub channel: Option<String>,
    pub message_ts: Option<String>,
    pub thread_ts: Option<String>,
}

impl SendResult {
    pub fn from_api(body: &Value) -> Self {
        // thread_ts lives on the nested message object when replying in a
        // thread; older responses carry it at the top level.
        let thread_ts = body
            .pointer("/message/thread_ts")
            .and_then(Value::as_str)
            .or_else(|| body.get("thread_ts").and_then(Value::as_str))
            .map(str::to_string);

        Self {
            ok: true,
            channel: body.get("channel").and_then(Value::as_str).map(str::to_string),
            message_ts: body.get("ts").and_then(Value::as_str).map(str::to_string),
            thread_ts,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryMessage {
    pub user: Option<String>,
    pub text: String,
    pub ts: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryList {
    pub messages: Vec<HistoryMessage>,
    pub has_more: bool,
}

impl HistoryList {
    pub fn from_api(body: &Value) -> Self {
        let messages = body
            .get("messages")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .map(|msg| HistoryMessage {
                        user: msg.get("user").and_then(Value::as_str).map(str::to_string),
                        text: msg
                            .get("text")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        ts: msg.get("ts").and_then(Value::as_str).map(str::to_string),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            messages,
            has_more: body.get("has_more").and_then(Value::as_bool).unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn channel_list_normalizes_entries_and_cursor() {
        let body = json!({
            "ok": true,
            "channels": [
                {"id": "C1", "name": "general", "is_private": false, "num_members": 42},
                {"id": "C2", "name": "secret", "is_private": true}
            ],
            "response_metadata": {"next_cursor": "dGVhbTpD"}
        });

        let list = ChannelList::from_api(&body);
        assert_eq!(list.channels.len(), 2);
        assert_eq!(list.channels[0].member_count, Some(42));
        assert!(list.channels[1].is_private);
        assert!(list.channels[1].member_count.is_none());
        assert_eq!(list.next_cursor.as_deref(), Some("dGVhbTpD"));
    }

    #[test]
    fn empty_cursor_means_no_more_pages() {
        let body = json!({
            "ok": true,
            "channels": [],
            "response_metadata": {"next_cursor": ""}
        });
        assert!(ChannelList::from_api(&body).next_cursor.is_none());
    }

    #[test]
    fn send_result_prefers_nested_thread_ts() {
        let body = json!({
            "ok": true,
            "channel": "C1",
            "ts": "1700000000.000100",
            "thread_ts": "1700000000.000001",
            "message": {"thread_ts": "1700000000.000099"}
        });

        let result = SendResult::from_api(&body);
        assert_eq!(result.thread_ts.as_deref(), Some("1700000000.000099"));
        assert_eq!(result.message_ts.as_deref(), Some("1700000000.000100"));
    }

    #[test]
    fn send_result_falls_back_to_top_level_thread_ts() {
        let body = json!({
            "ok": true,
            "channel": "C1",
            "ts": "1700000000.000100",
            "thread_ts": "1700000000.000001",
            "message": {"text": "hi"}
        });

        let result = SendResult::from_api(&body);
        assert_eq!(result.thread_ts.as_deref(), Some("1700000000.000001"));
    }

    #[test]
    fn history_normalizes_messages() {
        let body = json!({
            "ok": true,
            "messages": [
                {"user": "U1", "text": "hello", "ts": "1.0"},
                {"text": "bot message", "ts": "2.0"}
            ],
            "has_more": true
        });

        let history = HistoryList::from_api(&body);
        assert_eq!(history.messages.len(), 2);
        assert_eq!(history.messages[0].user.as_deref(), Some("U1"));
        assert!(history.messages[1].user.is_none());
        assert!(history.has_more);
    }
}
