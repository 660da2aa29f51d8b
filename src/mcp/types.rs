//! JSON-RPC frame types.
//!
//! Inbound frames are parsed at the transport boundary into tagged variants,
//! so malformed payloads fail fast with a typed error instead of surfacing as
//! missing-key lookups inside the dispatcher. A frame without an `id` is a
//! notification regardless of its method name.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol revision reported by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const TOOL_ERROR: i64 = -32000;
    pub const UNAUTHENTICATED: i64 = -32001;
}

// ── Inbound frames ─────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Frame {
    Request(RpcRequest),
    Notification(RpcNotification),
}

#[derive(Debug, Clone)]
pub struct RpcRequest {
    /// Opaque request correlator, echoed back in the response. Number or
    /// string per JSON-RPC; kept as a raw value.
    pub id: Value,
    pub method: String,
    pub params: Value,
}

#[derive(Debug, Clone)]
pub struct RpcNotification {
    pub method: String,
    pub params: Value,
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame is not a JSON object")]
    NotObject,
    #[error("missing or non-string method")]
    MissingMethod,
}

impl FrameError {
    pub fn code(&self) -> i64 {
        match self {
            FrameError::Json(_) => error_codes::PARSE_ERROR,
            FrameError::NotObject | FrameError::MissingMethod => error_codes::INVALID_REQUEST,
        }
    }
}

impl Frame {
    pub fn parse(raw: &str) -> Result<Frame, FrameError> {
        Frame::from_value(serde_json::from_str(raw)?)
    }

    pub fn from_value(value: Value) -> Result<Frame, FrameError> {
        let obj = value.as_object().ok_or(FrameError::NotObject)?;

        let method = obj
            .get("method")
            .and_then(Value::as_str)
            .ok_or(FrameError::MissingMethod)?
            .to_string();

        let params = obj.get("params").cloned().unwrap_or(Value::Null);

        match obj.get("id") {
            Some(id) if !id.is_null() => Ok(Frame::Request(RpcRequest {
                id: id.clone(),
                method,
                params,
            })),
            _ => Ok(Frame::Notification(RpcNotification { method, params })),
        }
    }

    pub fn method(&self) -> &str {
        match self {
            Frame::Request(r) => &r.method,
            Frame::Notification(n) => &n.method,
        }
    }
}

// ── Outbound frames ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i64, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
                data,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

/// Server-initiated notification. Carries no id and expects no reply.
#[derive(Debug, Clone, Serialize)]
pub struct ServerNotification {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: Value,
}

impl ServerNotification {
    /// Sent once when a long-lived session is established.
    pub fn connected(user_id: i64) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: "notifications/connected",
            params: serde_json::json!({
                "user_id": user_id,
                "message": "Connected to the workspace gateway.",
            }),
        }
    }
}

// ── Tool results ───────────────────────────────────────────────

/// Result payload of a `tools/call`, in MCP `content`/`isError` shape with
/// the normalized adapter payload attached as `structuredContent`.
#[derive(Debug, Clone, Serialize)]
pub struct CallToolResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError")]
    pub is_error: bool,
    #[serde(rename = "structuredContent", skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

impl CallToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
            structured_content: None,
        }
    }

    pub fn with_structured(text: impl Into<String>, structured: Option<Value>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
            structured_content: structured,
        }
    }

    pub fn tool_error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: true,
            structured_content: None,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_frame_parses() {
        let frame = Frame::parse(r#"{"jsonrpc":"2.0","id":7,"method":"tools/list"}"#).unwrap();
        match frame {
            Frame::Request(req) => {
                assert_eq!(req.id, json!(7));
                assert_eq!(req.method, "tools/list");
                assert!(req.params.is_null());
            }
            Frame::Notification(_) => panic!("expected request"),
        }
    }

    #[test]
    fn string_ids_are_preserved() {
        let frame = Frame::parse(r#"{"id":"req-1","method":"initialize"}"#).unwrap();
        match frame {
            Frame::Request(req) => assert_eq!(req.id, json!("req-1")),
            Frame::Notification(_) => panic!("expected request"),
        }
    }

    #[test]
    fn missing_id_is_notification() {
        let frame = Frame::parse(r#"{"jsonrpc":"2.0","method":"tools/call","params":{}}"#).unwrap();
        assert!(matches!(frame, Frame::Notification(_)));
    }

    #[test]
    fn null_id_is_notification() {
        let frame = Frame::parse(r#"{"id":null,"method":"initialize"}"#).unwrap();
        assert!(matches!(frame, Frame::Notification(_)));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = Frame::parse("{not json").unwrap_err();
        assert_eq!(err.code(), error_codes::PARSE_ERROR);
    }

    #[test]
    fn missing_method_is_invalid_request() {
        let err = Frame::parse(r#"{"id":1,"params":{}}"#).unwrap_err();
        assert!(matches!(err, FrameError::MissingMethod));
        assert_eq!(err.code(), error_codes::INVALID_REQUEST);

        let err = Frame::parse(r#"[1,2,3]"#).unwrap_err();
        assert!(matches!(err, FrameError::NotObject));
    }

    #[test]
    fn result_response_omits_error_field() {
        let resp = RpcResponse::result(json!(1), json!({"ok": true}));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["result"]["ok"], true);
        assert!(value.get("error").is_none());
    }

    #[test]
    fn error_response_omits_result_field() {
        let resp = RpcResponse::error(json!(2), error_codes::METHOD_NOT_FOUND, "nope", None);
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["error"]["code"], -32601);
        assert!(value.get("result").is_none());
        assert!(value["error"].get("data").is_none());
    }

    #[test]
    fn tool_result_serializes_mcp_shape() {
        let result = CallToolResult::with_structured("done", Some(json!({"n": 3})));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["content"][0]["type"], "text");
        assert_eq!(value["content"][0]["text"], "done");
        assert_eq!(value["isError"], false);
        assert_eq!(value["structuredContent"]["n"], 3);

        let err = CallToolResult::tool_error("boom");
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["isError"], true);
        assert!(value.get("structuredContent").is_none());
    }
}
