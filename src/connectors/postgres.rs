//! PostgreSQL connector over a deadpool connection pool.
//!
//! States: uninitialized -> ready -> closed. `initialize` proves
//! connectivity with `SELECT 1` before exposing the pool and leaves the
//! connector uninitialized when that probe fails.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use serde_json::{Map, Value as JsonValue};
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{NoTls, Row};

use crate::connectors::{Connector, SqlExecutor};
use crate::core::error::McpError;
use crate::infra::config::PostgresConfig;

pub struct PostgresConnector {
    cfg: PostgresConfig,
    pool: RwLock<Option<Pool>>,
}

impl PostgresConnector {
    pub fn new(cfg: PostgresConfig) -> Self {
        Self {
            cfg,
            pool: RwLock::new(None),
        }
    }

    fn current_pool(&self) -> Option<Pool> {
        self.pool.read().ok()?.clone()
    }

    /// Check out one pooled client; valid only in the ready state.
    pub async fn client(&self) -> Result<deadpool_postgres::Object, McpError> {
        let pool = self
            .current_pool()
            .ok_or_else(|| McpError::connection("PostgreSQL connector not initialized"))?;
        pool.get().await.map_err(|e| {
            McpError::connection(format!("failed to acquire connection: {e}"))
        })
    }

    fn connection_error(&self, message: String) -> McpError {
        McpError::connection("Failed to connect to PostgreSQL")
            .with_detail("host", self.cfg.host.clone())
            .with_detail("port", self.cfg.port)
            .with_detail("database", self.cfg.database.clone())
            .with_detail("error", message)
    }
}

#[async_trait]
impl Connector for PostgresConnector {
    async fn initialize(&self) -> Result<(), McpError> {
        if self.current_pool().is_some() {
            tracing::warn!("PostgreSQL connector already initialized");
            return Ok(());
        }

        tracing::info!(
            host = %self.cfg.host,
            port = self.cfg.port,
            database = %self.cfg.database,
            user = %self.cfg.user,
            "initializing PostgreSQL connector"
        );

        let pool = build_pool(&self.cfg)?;

        // Connection test; the pool is only published once it passes.
        let client = pool
            .get()
            .await
            .map_err(|e| self.connection_error(e.to_string()))?;
        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| self.connection_error(e.to_string()))?;
        drop(client);

        if let Ok(mut slot) = self.pool.write() {
            *slot = Some(pool);
        }
        tracing::info!("PostgreSQL connector initialized");
        Ok(())
    }

    async fn close(&self) {
        let taken = self.pool.write().ok().and_then(|mut slot| slot.take());
        if let Some(pool) = taken {
            tracing::info!("closing PostgreSQL connection pool");
            pool.close();
            tracing::info!("PostgreSQL connection pool closed");
        }
    }

    fn is_healthy(&self) -> bool {
        self.current_pool().map(|p| !p.is_closed()).unwrap_or(false)
    }
}

#[async_trait]
impl SqlExecutor for PostgresConnector {
    async fn query_rows(&self, sql: &str, params: &[&str]) -> Result<Vec<JsonValue>, McpError> {
        let client = self.client().await?;
        let bound: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        let rows = client
            .query(sql, &bound)
            .await
            .map_err(|e| McpError::connection(format!("query failed: {e}")))?;
        Ok(rows.iter().map(row_to_json).collect())
    }
}

fn build_pool(cfg: &PostgresConfig) -> Result<Pool, McpError> {
    let mut pc = deadpool_postgres::Config::new();
    pc.host = Some(cfg.host.clone());
    pc.port = Some(cfg.port);
    pc.dbname = Some(cfg.database.clone());
    pc.user = Some(cfg.user.clone());
    pc.password = Some(cfg.password.clone());
    pc.application_name = Some("postgres-mcp-gateway".into());
    pc.connect_timeout = Some(Duration::from_millis(cfg.connect_timeout_ms));
    pc.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    let mut pool_cfg = PoolConfig::new(cfg.max_connections);
    pool_cfg.timeouts.create = Some(Duration::from_millis(cfg.connect_timeout_ms));
    pool_cfg.timeouts.wait = Some(Duration::from_millis(cfg.connect_timeout_ms));
    pc.pool = Some(pool_cfg);

    pc.create_pool(Some(Runtime::Tokio1), NoTls)
        .map_err(|e| McpError::connection(format!("failed to build connection pool: {e}")))
}

/// Decode one row into a JSON object keyed by column name. Column types
/// without a native mapping degrade to their text form when the driver can
/// render one, else to a `<type>` placeholder.
fn row_to_json(row: &Row) -> JsonValue {
    let mut obj = Map::new();
    for (idx, col) in row.columns().iter().enumerate() {
        obj.insert(col.name().to_string(), cell_to_json(row, idx, col.type_()));
    }
    JsonValue::Object(obj)
}

fn cell_to_json(row: &Row, idx: usize, ty: &Type) -> JsonValue {
    if *ty == Type::BOOL {
        json_cell(row.try_get::<_, Option<bool>>(idx).ok().flatten())
    } else if *ty == Type::INT2 {
        json_cell(row.try_get::<_, Option<i16>>(idx).ok().flatten())
    } else if *ty == Type::INT4 {
        json_cell(row.try_get::<_, Option<i32>>(idx).ok().flatten())
    } else if *ty == Type::INT8 {
        json_cell(row.try_get::<_, Option<i64>>(idx).ok().flatten())
    } else if *ty == Type::FLOAT4 {
        json_cell(
            row.try_get::<_, Option<f32>>(idx)
                .ok()
                .flatten()
                .map(|f| f as f64),
        )
    } else if *ty == Type::FLOAT8 {
        json_cell(row.try_get::<_, Option<f64>>(idx).ok().flatten())
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        row.try_get::<_, Option<JsonValue>>(idx)
            .ok()
            .flatten()
            .unwrap_or(JsonValue::Null)
    } else if *ty == Type::TIMESTAMPTZ {
        json_cell(
            row.try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)
                .ok()
                .flatten()
                .map(|ts| ts.to_rfc3339()),
        )
    } else if *ty == Type::TIMESTAMP {
        json_cell(
            row.try_get::<_, Option<chrono::NaiveDateTime>>(idx)
                .ok()
                .flatten()
                .map(|ts| ts.to_string()),
        )
    } else if *ty == Type::DATE {
        json_cell(
            row.try_get::<_, Option<chrono::NaiveDate>>(idx)
                .ok()
                .flatten()
                .map(|d| d.to_string()),
        )
    } else {
        match row.try_get::<_, Option<String>>(idx) {
            Ok(value) => json_cell(value),
            Err(_) => JsonValue::String(format!("<{}>", ty.name())),
        }
    }
}

fn json_cell<T: Into<JsonValue>>(value: Option<T>) -> JsonValue {
    value.map(Into::into).unwrap_or(JsonValue::Null)
}
