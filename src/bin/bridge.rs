//! stdio ⇄ HTTP bridge for MCP clients that only speak stdio.
//!
//! Reads newline-delimited JSON-RPC frames on stdin, forwards requests to a
//! running gateway's single-shot endpoint, and writes responses on stdout.
//! Notifications are consumed locally. Logs go to stderr because stdout is
//! reserved for protocol frames.

use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};

fn log(message: &str) {
    eprintln!("[bridge] {message}");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let token = std::env::var("TEAMLINK_SESSION_TOKEN").unwrap_or_default();
    let base_url =
        std::env::var("TEAMLINK_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".into());

    if token.is_empty() {
        let err = json!({
            "jsonrpc": "2.0",
            "id": null,
            "error": {
                "code": -32000,
                "message": "TEAMLINK_SESSION_TOKEN not set. Mint one with `teamlink session --user-id <id>`.",
            }
        });
        println!("{err}");
        std::process::exit(1);
    }

    let endpoint = format!(
        "{}/mcp/http?session_token={}",
        base_url.trim_end_matches('/'),
        token
    );
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    log(&format!("forwarding to {base_url}"));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                log(&format!("invalid JSON on stdin: {e}"));
                continue;
            }
        };

        let method = request
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        // Notifications never get a response frame, so there is nothing to
        // forward or print.
        let is_notification = request.get("id").map_or(true, Value::is_null)
            || method == "initialized"
            || method.starts_with("notifications/");
        if is_notification {
            log(&format!("notification consumed: {method}"));
            continue;
        }

        log(&format!("request: {method}"));
        let response = forward(&http, &endpoint, &request).await;
        println!("{response}");
    }

    log("stdin closed, shutting down");
    Ok(())
}

async fn forward(http: &reqwest::Client, endpoint: &str, request: &Value) -> Value {
    let id = request.get("id").cloned().unwrap_or(Value::Null);

    match http.post(endpoint).json(request).send().await {
        Ok(resp) if resp.status().is_success() => match resp.json::<Value>().await {
            Ok(body) => body,
            Err(e) => bridge_error(id, format!("invalid response body: {e}")),
        },
        Ok(resp) => bridge_error(id, format!("gateway returned {}", resp.status())),
        Err(e) => bridge_error(id, format!("request failed: {e}")),
    }
}

fn bridge_error(id: Value, message: String) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": -32000, "message": message }
    })
}
