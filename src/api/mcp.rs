//! Protocol dispatch: JSON-RPC requests in, tool results out.
//!
//! `tools/call` always answers with a JSON-RPC *result* carrying a
//! [`ToolResult`]; an unknown tool or a failing handler degrades to an
//! `isError` payload and never crashes the transport or the process.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value as J};

use crate::core::content::ToolResult;
use crate::core::mcp::{err as rpc_err, ok as rpc_ok, parse_error, RpcReq, RpcResp};
use crate::infra::http_app::AppState;
use crate::tools::registry::ToolRegistry;

fn server_info() -> J {
    json!({
        "serverInfo": {
            "name": "postgres-mcp-gateway",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "capabilities": { "tools": {} }
    })
}

fn tools_list(reg: &ToolRegistry) -> J {
    let tools: Vec<J> = reg
        .get_all()
        .iter()
        .map(|t| {
            json!({
                "name": t.name(),
                "description": t.description(),
                "inputSchema": t.input_schema(),
            })
        })
        .collect();
    json!({ "tools": tools })
}

/// Invoke a tool by name. Every failure, including an unknown name, comes
/// back as a ToolResult with `is_error` set; this function cannot fail.
async fn call_tool(reg: &ToolRegistry, params: &J) -> ToolResult {
    let Some(name) = params.get("name").and_then(|v| v.as_str()) else {
        return ToolResult::error("missing tool name");
    };

    let Some(tool) = reg.get(name) else {
        tracing::warn!(tool = name, "unknown tool");
        return ToolResult::error(format!("Unknown tool: {name}"));
    };

    tracing::info!(tool = name, "tool call");
    metrics::counter!("tool_calls_total", "tool" => name.to_string()).increment(1);

    let args = params.get("arguments").cloned().unwrap_or(J::Null);
    match tool.call(&args).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(tool = name, error = %e, "tool execution failed");
            metrics::counter!("tool_errors_total", "tool" => name.to_string()).increment(1);
            ToolResult::error(e.render())
        }
    }
}

/// Handle one decoded request frame, shared by both transports.
pub async fn dispatch(reg: &ToolRegistry, req: RpcReq) -> RpcResp {
    let id = req.id;
    match req.method.as_str() {
        "initialize" => rpc_ok(id, server_info()),
        "shutdown" => rpc_ok(id, J::Null),
        "tools.list" | "tools/list" => rpc_ok(id, tools_list(reg)),
        "tools.call" | "tools/call" => {
            let result = call_tool(reg, &req.params).await;
            rpc_ok(id, serde_json::to_value(&result).unwrap_or(J::Null))
        }
        _ => rpc_err(id, -32601, format!("unknown method: {}", req.method), None),
    }
}

// HTTP handler: one JSON-RPC request per POST. Malformed bodies are
// rejected by the Json extractor before this runs.
pub async fn http(State(state): State<AppState>, Json(req): Json<RpcReq>) -> Json<RpcResp> {
    tracing::debug!(method = %req.method, id = ?req.id, "rpc request");
    Json(dispatch(&state.registry, req).await)
}

/// Newline-delimited JSON-RPC over stdin/stdout. Frames without an id are
/// notifications and get no response; logging stays on stderr so stdout
/// carries protocol frames only.
pub async fn stdio_loop(reg: Arc<ToolRegistry>) -> anyhow::Result<()> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<RpcReq>(&line) {
            Ok(req) => {
                let notification = req.id.is_null();
                let resp = dispatch(&reg, req).await;
                if notification {
                    continue;
                }
                resp
            }
            Err(e) => parse_error(format!("parse error: {e}")),
        };

        let s = serde_json::to_string(&resp)?;
        println!("{s}");
        io::stdout().flush()?;
    }
    Ok(())
}
