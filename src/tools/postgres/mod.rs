//! PostgreSQL tool set: schema introspection plus guarded ad-hoc SELECTs.

pub mod guard;
pub mod queries;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use crate::connectors::SqlExecutor;
use crate::core::content::ToolResult;
use crate::core::error::McpError;
use crate::core::tool::Tool;

use self::guard::{ensure_limit, validate_read_only_query};
use self::queries::{DESCRIBE_TABLE_QUERY, LIST_TABLES_QUERY};

/// Build the three PostgreSQL tools over one shared executor and default
/// schema, in their registration order.
pub fn postgres_tools(db: Arc<dyn SqlExecutor>, default_schema: &str) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListTablesTool {
            db: db.clone(),
            default_schema: default_schema.to_string(),
        }) as Arc<dyn Tool>,
        Arc::new(DescribeTableTool {
            db: db.clone(),
            default_schema: default_schema.to_string(),
        }),
        Arc::new(QueryTool { db }),
    ]
}

// Connector-level failures are reported as execution errors naming the tool
// that hit them; validation and security errors pass through untouched.
fn execution_error(tool: &str, err: McpError) -> McpError {
    McpError::execution(err.message).with_detail("toolName", tool)
}

fn pretty(value: &JsonValue) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

pub struct ListTablesTool {
    db: Arc<dyn SqlExecutor>,
    default_schema: String,
}

#[async_trait]
impl Tool for ListTablesTool {
    fn name(&self) -> &'static str {
        "postgres_list_tables"
    }
    fn description(&self) -> &'static str {
        "List all tables in the configured schema (PostgreSQL)"
    }
    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "schema": {
                    "type": "string",
                    "description": "Schema name (defaults to configured schema)"
                }
            }
        })
    }
    async fn call(&self, arguments: &JsonValue) -> Result<ToolResult, McpError> {
        let schema = arguments
            .get("schema")
            .and_then(|v| v.as_str())
            .unwrap_or(&self.default_schema);
        tracing::debug!(schema, "postgres_list_tables");

        let rows = self
            .db
            .query_rows(LIST_TABLES_QUERY, &[schema])
            .await
            .map_err(|e| execution_error(self.name(), e))?;

        Ok(ToolResult::text(pretty(&JsonValue::Array(rows))))
    }
}

pub struct DescribeTableTool {
    db: Arc<dyn SqlExecutor>,
    default_schema: String,
}

#[async_trait]
impl Tool for DescribeTableTool {
    fn name(&self) -> &'static str {
        "postgres_describe_table"
    }
    fn description(&self) -> &'static str {
        "Describe table columns and their types (PostgreSQL)"
    }
    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "required": ["table_name"],
            "properties": {
                "table_name": {
                    "type": "string",
                    "description": "Name of the table to describe"
                },
                "schema": {
                    "type": "string",
                    "description": "Schema name (defaults to configured schema)"
                }
            }
        })
    }
    async fn call(&self, arguments: &JsonValue) -> Result<ToolResult, McpError> {
        let table = arguments
            .get("table_name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| McpError::validation("table_name is required"))?;
        let schema = arguments
            .get("schema")
            .and_then(|v| v.as_str())
            .unwrap_or(&self.default_schema);
        tracing::debug!(schema, table, "postgres_describe_table");

        let rows = self
            .db
            .query_rows(DESCRIBE_TABLE_QUERY, &[schema, table])
            .await
            .map_err(|e| execution_error(self.name(), e))?;

        // Zero rows means the query ran fine and found nothing; report it
        // in-band rather than as an execution failure.
        if rows.is_empty() {
            return Ok(ToolResult::error(
                json!({
                    "error": "Table not found",
                    "schema": schema,
                    "table": table,
                })
                .to_string(),
            ));
        }

        Ok(ToolResult::text(pretty(&JsonValue::Array(rows))))
    }
}

pub struct QueryTool {
    db: Arc<dyn SqlExecutor>,
}

#[async_trait]
impl Tool for QueryTool {
    fn name(&self) -> &'static str {
        "postgres_query"
    }
    fn description(&self) -> &'static str {
        "Execute a read-only SQL SELECT query (PostgreSQL)"
    }
    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "required": ["sql"],
            "properties": {
                "sql": {
                    "type": "string",
                    "description": "SELECT-only SQL query to execute"
                },
                "max_rows": {
                    "type": "number",
                    "description": "Maximum number of rows to return (default: 100)"
                }
            }
        })
    }
    async fn call(&self, arguments: &JsonValue) -> Result<ToolResult, McpError> {
        let sql = arguments
            .get("sql")
            .and_then(|v| v.as_str())
            .ok_or_else(|| McpError::validation("sql parameter is required"))?;

        validate_read_only_query(sql)?;

        let max_rows = arguments
            .get("max_rows")
            .and_then(|v| v.as_f64())
            .unwrap_or(100.0);
        let limited = ensure_limit(sql, max_rows);
        tracing::debug!(query_len = limited.len(), max_rows, "postgres_query");

        let rows = self
            .db
            .query_rows(&limited, &[])
            .await
            .map_err(|e| execution_error(self.name(), e))?;

        let payload = json!({
            "rowCount": rows.len(),
            "rows": rows,
        });
        Ok(ToolResult::text(pretty(&payload)))
    }
}
