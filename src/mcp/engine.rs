//! Transport-agnostic JSON-RPC dispatcher.
//!
//! Every transport binding hands parsed frames to `handle_frame` and writes
//! back whatever it returns, so the method set and error mapping live in
//! exactly one place. Downstream API failures are rendered as tool-scoped
//! error results; they never close the connection.

use serde_json::{json, Value};

use super::catalog;
use super::session::ConnectionContext;
use super::types::{error_codes, CallToolResult, Frame, RpcRequest, RpcResponse};
use crate::slack::client::{SlackClient, SlackError, DEFAULT_CHANNEL_LIMIT, DEFAULT_HISTORY_LIMIT};
use crate::AppState;

/// Dispatch one inbound frame. Returns `None` when no response frame must be
/// written: notifications and notification-style methods are consumed
/// silently.
pub async fn handle_frame(
    state: &AppState,
    ctx: &ConnectionContext,
    frame: Frame,
) -> Option<RpcResponse> {
    let RpcRequest { id, method, params } = match frame {
        Frame::Notification(note) => {
            tracing::debug!(user_id = ctx.user_id, method = %note.method, "notification consumed");
            return None;
        }
        Frame::Request(req) => req,
    };

    // `initialized` and `notifications/*` are fire-and-forget by protocol
    // convention, even when a client attaches an id.
    if method == "initialized" || method.starts_with("notifications/") {
        tracing::debug!(user_id = ctx.user_id, method = %method, "notification consumed");
        return None;
    }

    let response = match method.as_str() {
        "initialize" => RpcResponse::result(
            id,
            json!({
                "protocolVersion": super::types::PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": "teamlink",
                    "version": env!("CARGO_PKG_VERSION"),
                },
            }),
        ),
        "tools/list" => RpcResponse::result(
            id,
            json!({
                "tools": catalog::as_json(),
                "catalogVersion": catalog::CATALOG_VERSION,
            }),
        ),
        "tools/call" => call_tool(state, ctx, id, params).await,
        other => RpcResponse::error(
            id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {other}"),
            None,
        ),
    };

    Some(response)
}

enum ToolError {
    Arguments(String),
    Downstream(SlackError),
}

impl From<SlackError> for ToolError {
    fn from(e: SlackError) -> Self {
        ToolError::Downstream(e)
    }
}

async fn call_tool(state: &AppState, ctx: &ConnectionContext, id: Value, params: Value) -> RpcResponse {
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return RpcResponse::error(
            id,
            error_codes::INVALID_PARAMS,
            "Missing tool name",
            None,
        );
    };
    let args = params
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| json!({}));

    // Resolve the credential before looking at the tool name, so an unlinked
    // caller always gets the connect guidance instead of a tool error.
    let credential = match state.store.active_credential(ctx.user_id).await {
        Ok(credential) => credential,
        Err(e) => {
            tracing::error!(user_id = ctx.user_id, "credential lookup failed: {e}");
            return RpcResponse::error(
                id,
                error_codes::TOOL_ERROR,
                "credential lookup failed",
                None,
            );
        }
    };
    let Some(credential) = credential else {
        return RpcResponse::result(id, structured(not_linked_result(state, ctx)));
    };

    tracing::info!(user_id = ctx.user_id, tool = name, "tool invocation");

    let client = SlackClient::new(
        state.http.clone(),
        &state.config.slack_api_base,
        &credential.access_token,
    );

    let outcome = match name {
        "list_channels" => list_channels(&client, &args).await,
        "send_message" => send_message(&client, &args).await,
        "fetch_history" => fetch_history(&client, &args).await,
        other => {
            return RpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Unknown tool: {other}"),
                None,
            )
        }
    };

    match outcome {
        Ok(result) => RpcResponse::result(id, structured(result)),
        Err(ToolError::Arguments(message)) => {
            RpcResponse::error(id, error_codes::INVALID_PARAMS, message, None)
        }
        Err(ToolError::Downstream(e)) => {
            tracing::warn!(user_id = ctx.user_id, tool = name, "tool call failed: {e}");
            RpcResponse::result(
                id,
                structured(CallToolResult::tool_error(format!(
                    "Error executing {name}: {e}"
                ))),
            )
        }
    }
}

/// Non-error result telling the caller to link a workspace first, with a
/// fresh link-start URL generic clients can surface as guidance.
fn not_linked_result(state: &AppState, ctx: &ConnectionContext) -> CallToolResult {
    let connect_url = format!(
        "{}/oauth/slack/start?session_token={}",
        state.config.public_url, ctx.session_token
    );
    CallToolResult {
        content: vec![super::types::ToolContent::Text {
            text: format!(
                "No workspace is linked for this account. Open {connect_url} to connect one, then try again."
            ),
        }],
        is_error: false,
        structured_content: Some(json!({
            "connected": false,
            "connect_url": connect_url,
        })),
    }
}

async fn list_channels(client: &SlackClient, args: &Value) -> Result<CallToolResult, ToolError> {
    let limit = args
        .get("limit")
        .and_then(Value::as_u64)
        .map(|l| l as u32)
        .unwrap_or(DEFAULT_CHANNEL_LIMIT);
    let include_private = args
        .get("include_private")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let list = client.list_channels(limit, include_private).await?;
    let text = format!("Found {} channels", list.channels.len());
    Ok(CallToolResult::with_structured(
        text,
        serde_json::to_value(&list).ok(),
    ))
}

async fn send_message(client: &SlackClient, args: &Value) -> Result<CallToolResult, ToolError> {
    let channel_id = args
        .get("channel_id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());
    let text = args
        .get("text")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());
    let (Some(channel_id), Some(text)) = (channel_id, text) else {
        return Err(ToolError::Arguments(
            "Missing required fields: channel_id and text".to_string(),
        ));
    };

    let thread_ts = args.get("thread_ts").and_then(Value::as_str);
    let reply_broadcast = args
        .get("reply_broadcast")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let sent = client
        .send_message(channel_id, text, thread_ts, reply_broadcast)
        .await?;
    let text = format!("Message sent to {channel_id}");
    Ok(CallToolResult::with_structured(
        text,
        serde_json::to_value(&sent).ok(),
    ))
}

async fn fetch_history(client: &SlackClient, args: &Value) -> Result<CallToolResult, ToolError> {
    let Some(channel_id) = args
        .get("channel_id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    else {
        return Err(ToolError::Arguments(
            "Missing required field: channel_id".to_string(),
        ));
    };
    let limit = args
        .get("limit")
        .and_then(Value::as_u64)
        .map(|l| l as u32)
        .unwrap_or(DEFAULT_HISTORY_LIMIT);

    let history = client.fetch_history(channel_id, limit).await?;
    let text = format!(
        "Fetched {} messages from {channel_id}",
        history.messages.len()
    );
    Ok(CallToolResult::with_structured(
        text,
        serde_json::to_value(&history).ok(),
    ))
}

fn structured(result: CallToolResult) -> Value {
    serde_json::to_value(&result).unwrap_or(Value::Null)
}
