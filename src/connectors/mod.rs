//! External resource connectors and the narrow seams tools consume them
//! through.

pub mod postgres;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::core::error::McpError;

/// Lifecycle contract for a pooled external resource.
///
/// `initialize` moves the connector from uninitialized to ready and must
/// leave it uninitialized on failure; `is_healthy` is a non-mutating probe.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn initialize(&self) -> Result<(), McpError>;
    async fn close(&self);
    fn is_healthy(&self) -> bool;
}

/// Query seam the tool set runs against, stubbed out in tests.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Run a parameterized query, returning one JSON object per row.
    async fn query_rows(&self, sql: &str, params: &[&str]) -> Result<Vec<JsonValue>, McpError>;
}
