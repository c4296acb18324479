use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use hyper::Request;
use serde_json::{json, Value as J};
use tower::ServiceExt;

use postgres_mcp_gateway::connectors::{Connector, SqlExecutor};
use postgres_mcp_gateway::core::error::McpError;
use postgres_mcp_gateway::infra::http_app::{build_app, AppState};
use postgres_mcp_gateway::tools::postgres::postgres_tools;
use postgres_mcp_gateway::tools::registry::ToolRegistry;

const BODY_LIMIT: usize = 1024 * 1024;

struct StubBackend {
    rows: Vec<J>,
    healthy: bool,
}

#[async_trait]
impl SqlExecutor for StubBackend {
    async fn query_rows(&self, _sql: &str, _params: &[&str]) -> Result<Vec<J>, McpError> {
        Ok(self.rows.clone())
    }
}

#[async_trait]
impl Connector for StubBackend {
    async fn initialize(&self) -> Result<(), McpError> {
        Ok(())
    }
    async fn close(&self) {}
    fn is_healthy(&self) -> bool {
        self.healthy
    }
}

fn app_with(rows: Vec<J>, healthy: bool) -> axum::Router {
    let backend = Arc::new(StubBackend { rows, healthy });
    let mut registry = ToolRegistry::new();
    registry.register(postgres_tools(backend.clone(), "public"));
    build_app(AppState {
        registry: Arc::new(registry),
        connector: backend,
    })
}

fn rpc_post(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> J {
    let bytes = to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn tools_list_returns_all_three_tools_in_order() {
    let app = app_with(vec![], true);
    let resp = app
        .oneshot(rpc_post(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#.into(),
        ))
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let v = body_json(resp).await;
    let tools = v["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 3);
    assert_eq!(tools[0]["name"], "postgres_list_tables");
    assert_eq!(tools[1]["name"], "postgres_describe_table");
    assert_eq!(tools[2]["name"], "postgres_query");
    assert!(tools[2]["inputSchema"]["required"]
        .as_array()
        .unwrap()
        .contains(&json!("sql")));
}

#[tokio::test]
async fn query_call_returns_rows_as_text_payload() {
    let app = app_with(vec![json!({"id": 1, "email": "a@example.com"})], true);
    let body = json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "tools/call",
        "params": {"name": "postgres_query", "arguments": {"sql": "SELECT * FROM users"}}
    });
    let resp = app.oneshot(rpc_post(body.to_string())).await.unwrap();
    assert!(resp.status().is_success());
    let v = body_json(resp).await;
    let result = &v["result"];
    assert!(result.get("isError").is_none());
    let text = result["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("\"rowCount\": 1"));
    assert!(text.contains("a@example.com"));
}

#[tokio::test]
async fn mutating_query_is_reported_in_band_not_as_rpc_error() {
    let app = app_with(vec![], true);
    let body = json!({
        "jsonrpc": "2.0",
        "id": 3,
        "method": "tools/call",
        "params": {"name": "postgres_query", "arguments": {"sql": "DROP TABLE users"}}
    });
    let resp = app.oneshot(rpc_post(body.to_string())).await.unwrap();
    assert!(resp.status().is_success());
    let v = body_json(resp).await;
    assert!(v.get("error").is_none());
    let result = &v["result"];
    assert_eq!(result["isError"], true);
    let text = result["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("SECURITY_ERROR"));
    assert!(text.contains("Only SELECT queries are allowed"));
}

#[tokio::test]
async fn missing_required_argument_renders_validation_error() {
    let app = app_with(vec![], true);
    let body = json!({
        "jsonrpc": "2.0",
        "id": 4,
        "method": "tools/call",
        "params": {"name": "postgres_describe_table", "arguments": {}}
    });
    let resp = app.oneshot(rpc_post(body.to_string())).await.unwrap();
    let v = body_json(resp).await;
    let result = &v["result"];
    assert_eq!(result["isError"], true);
    let text = result["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("VALIDATION_ERROR"));
    assert!(text.contains("table_name is required"));
}

#[tokio::test]
async fn describe_of_absent_table_reports_table_not_found() {
    let app = app_with(vec![], true);
    let body = json!({
        "jsonrpc": "2.0",
        "id": 5,
        "method": "tools/call",
        "params": {"name": "postgres_describe_table", "arguments": {"table_name": "ghosts"}}
    });
    let resp = app.oneshot(rpc_post(body.to_string())).await.unwrap();
    let v = body_json(resp).await;
    let result = &v["result"];
    assert_eq!(result["isError"], true);
    assert!(result["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("Table not found"));
}

#[tokio::test]
async fn unknown_tool_never_raises() {
    let app = app_with(vec![], true);
    let body = json!({
        "jsonrpc": "2.0",
        "id": 6,
        "method": "tools/call",
        "params": {"name": "does.not.exist", "arguments": {}}
    });
    let resp = app.oneshot(rpc_post(body.to_string())).await.unwrap();
    assert!(resp.status().is_success());
    let v = body_json(resp).await;
    assert!(v.get("error").is_none());
    assert_eq!(v["result"]["isError"], true);
    assert_eq!(
        v["result"]["content"][0]["text"],
        "Unknown tool: does.not.exist"
    );
}

#[tokio::test]
async fn unknown_method_returns_method_not_found() {
    let app = app_with(vec![], true);
    let resp = app
        .oneshot(rpc_post(
            r#"{"jsonrpc":"2.0","id":7,"method":"nope"}"#.into(),
        ))
        .await
        .unwrap();
    let v = body_json(resp).await;
    assert_eq!(v["error"]["code"], -32601);
}

#[tokio::test]
async fn malformed_json_is_rejected_by_the_extractor() {
    let app = app_with(vec![], true);
    let resp = app.oneshot(rpc_post("{ not-json }".into())).await.unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn initialize_reports_server_identity() {
    let app = app_with(vec![], true);
    let resp = app
        .oneshot(rpc_post(
            r#"{"jsonrpc":"2.0","id":8,"method":"initialize","params":{}}"#.into(),
        ))
        .await
        .unwrap();
    let v = body_json(resp).await;
    assert_eq!(v["result"]["serverInfo"]["name"], "postgres-mcp-gateway");
}

#[tokio::test]
async fn healthz_reflects_connector_health() {
    let app = app_with(vec![], true);
    let req = Request::builder()
        .method("GET")
        .uri("/healthz")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), 200);

    let degraded = app_with(vec![], false);
    let req = Request::builder()
        .method("GET")
        .uri("/healthz")
        .body(Body::empty())
        .unwrap();
    let resp = degraded.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), 503);
}
