use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::connectors::{Connector, SqlExecutor};

#[derive(Parser)]
#[command(name = "postgres-mcp-gateway")]
#[command(about = "PostgreSQL MCP Gateway - Admin CLI")]
#[command(version)]
pub struct Cli {
    /// With no subcommand the gateway starts serving.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Health check the service
    Health {
        /// Service URL to check
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
    /// Validate configuration
    Config,
    /// Show service status and registered tools
    Status {
        /// Service URL to check
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
    /// Test database connectivity
    TestDb,
}

pub async fn run_commands(command: Commands) -> ExitCode {
    match command {
        Commands::Health { url } => match health_check(&url).await {
            Ok(_) => {
                println!("✅ Service is healthy");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Health check failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Config => match validate_config() {
            Ok(_) => {
                println!("✅ Configuration is valid");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Configuration validation failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Status { url } => match show_status(&url).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("❌ Status check failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::TestDb => match test_db().await {
            Ok(_) => {
                println!("✅ Database connectivity test passed");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Database connectivity test failed: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn health_check(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/healthz", url))
        .timeout(std::time::Duration::from_millis(500))
        .send()
        .await?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("HTTP {}", response.status()).into())
    }
}

fn validate_config() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = crate::infra::config::AppConfig::load()?;
    println!("  Mode: {}", cfg.mode);
    println!("  Port: {}", cfg.port);
    println!("  Postgres enabled: {}", cfg.enable_postgres);
    Ok(())
}

async fn show_status(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();

    let health_response = client
        .get(format!("{}/healthz", url))
        .timeout(std::time::Duration::from_secs(5))
        .send()
        .await?;

    println!(
        "🏥 Health Status: {}",
        if health_response.status().is_success() {
            "✅ Healthy"
        } else {
            "❌ Unhealthy"
        }
    );

    let tools_response = client
        .post(format!("{}/mcp", url))
        .header("content-type", "application/json")
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/list",
            "params": {}
        }))
        .timeout(std::time::Duration::from_millis(500))
        .send()
        .await;

    match tools_response {
        Ok(resp) if resp.status().is_success() => {
            let body: serde_json::Value = resp.json().await.unwrap_or_default();
            match body["result"]["tools"].as_array() {
                Some(tools) => {
                    println!("🔧 Tools: ✅ {} registered", tools.len());
                    for tool in tools {
                        if let Some(name) = tool["name"].as_str() {
                            println!("  - {}", name);
                        }
                    }
                }
                None => println!("🔧 Tools: ✅ Available"),
            }
        }
        Ok(resp) => {
            println!("🔧 Tools: ❌ HTTP {}", resp.status());
        }
        Err(_) => {
            println!("🔧 Tools: ❌ Unavailable");
        }
    }

    println!("\n📋 Configuration:");
    match crate::infra::config::AppConfig::load() {
        Ok(cfg) => {
            println!("  Mode: {}", cfg.mode);
            println!("  Port: {}", cfg.port);
            println!("  Log Level: {}", cfg.logging.level);
            if cfg.enable_postgres {
                println!(
                    "  Postgres: {}:{}/{} (schema {})",
                    cfg.postgres.host, cfg.postgres.port, cfg.postgres.database, cfg.postgres.schema
                );
            } else {
                println!("  Postgres: disabled");
            }
        }
        Err(e) => println!("  (invalid: {})", e),
    }

    Ok(())
}

async fn test_db() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = crate::infra::config::AppConfig::load()?;
    let connector = crate::connectors::postgres::PostgresConnector::new(cfg.postgres.clone());

    connector.initialize().await?;
    let rows = connector.query_rows("SELECT 1 AS ping", &[]).await?;
    connector.close().await;

    println!(
        "🗄️  Connected to {}:{}/{} ({} row returned)",
        cfg.postgres.host,
        cfg.postgres.port,
        cfg.postgres.database,
        rows.len()
    );
    Ok(())
}
