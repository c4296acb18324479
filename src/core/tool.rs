use async_trait::async_trait;

use crate::core::content::ToolResult;
use crate::core::error::McpError;

/// A named, schema-described operation exposed to MCP callers.
///
/// Descriptors are immutable once registered; the registry holds them as
/// `Arc<dyn Tool>` and hands out shared references.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn input_schema(&self) -> serde_json::Value;
    async fn call(&self, arguments: &serde_json::Value) -> Result<ToolResult, McpError>;
}
