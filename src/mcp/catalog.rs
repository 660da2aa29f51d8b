//! Static tool catalog.
//!
//! Loaded once at startup and served unfiltered to every caller; there is no
//! per-user tool customization.

use once_cell::sync::Lazy;
use serde_json::{json, Value};

pub const CATALOG_VERSION: &str = "1.0.0";

pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

pub static CATALOG: Lazy<Vec<ToolDefinition>> = Lazy::new(|| {
    vec![
        ToolDefinition {
            name: "list_channels",
            description: "List channels in the connected workspace",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "limit": {
                        "type": "number",
                        "description": "Maximum number of channels to return (default: 20)"
                    },
                    "include_private": {
                        "type": "boolean",
                        "description": "Include private channels (default: false)"
                    }
                }
            }),
        },
        ToolDefinition {
            name: "send_message",
            description: "Send a message to a workspace channel",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "channel_id": {
                        "type": "string",
                        "description": "The channel ID (e.g., C0A1RJ2D0TV)"
                    },
                    "text": {
                        "type": "string",
                        "description": "The message text to send"
                    },
                    "thread_ts": {
                        "type": "string",
                        "description": "Thread timestamp to reply to (optional)"
                    },
                    "reply_broadcast": {
                        "type": "boolean",
                        "description": "Also post a thread reply to the channel (default: false)"
                    }
                },
                "required": ["channel_id", "text"]
            }),
        },
        ToolDefinition {
            name: "fetch_history",
            description: "Fetch message history from a workspace channel",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "channel_id": {
                        "type": "string",
                        "description": "The channel ID"
                    },
                    "limit": {
                        "type": "number",
                        "description": "Number of messages to fetch (default: 10, max: 100)"
                    }
                },
                "required": ["channel_id"]
            }),
        },
    ]
});

/// The catalog as the `tools` array of a `tools/list` result.
pub fn as_json() -> Value {
    Value::Array(
        CATALOG
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "inputSchema": tool.input_schema,
                })
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lists_every_tool() {
        let names: Vec<&str> = CATALOG.iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["list_channels", "send_message", "fetch_history"]);
    }

    #[test]
    fn schemas_mark_required_fields() {
        let tools = as_json();
        let send = &tools[1];
        assert_eq!(send["name"], "send_message");
        let required: Vec<&str> = send["inputSchema"]["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(required, vec!["channel_id", "text"]);
    }
}
