//! Startup wiring: config -> connector -> tools -> registry -> serve.
//!
//! Failures here terminate the process; once serving starts, every
//! caller-facing failure is reported in-band by the dispatcher.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::connectors::postgres::PostgresConnector;
use crate::connectors::{Connector, SqlExecutor};
use crate::core::error::McpError;
use crate::infra::config::AppConfig;
use crate::infra::http_app::{build_app, AppState};
use crate::tools::registry::ToolRegistry;

pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    tracing::info!(
        mode = %cfg.mode,
        port = cfg.port,
        enable_postgres = cfg.enable_postgres,
        "BOOT postgres-mcp-gateway"
    );

    let connector = Arc::new(PostgresConnector::new(cfg.postgres.clone()));
    let mut registry = ToolRegistry::new();

    if cfg.enable_postgres {
        connector.initialize().await?;
        let tools = crate::tools::postgres::postgres_tools(
            connector.clone() as Arc<dyn SqlExecutor>,
            &cfg.postgres.schema,
        );
        registry.register(tools);
        tracing::info!(count = registry.count(), tools = ?registry.names(), "postgres tools registered");
    } else {
        tracing::info!("postgres tools disabled");
    }

    if registry.count() == 0 {
        return Err(McpError::configuration(
            "No tools enabled. Enable at least one connector (postgres)",
        )
        .into());
    }

    let registry = Arc::new(registry);

    if cfg.mode == "stdio" {
        tracing::info!(tools = ?registry.names(), "MCP server running on stdio");
        let served = crate::api::mcp::stdio_loop(registry).await;
        connector.close().await;
        return served;
    }

    let state = AppState {
        registry,
        connector: connector.clone() as Arc<dyn Connector>,
    };
    let app = build_app(state);

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "MCP server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    connector.close().await;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
