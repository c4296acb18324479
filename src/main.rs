use std::process::ExitCode;

use clap::Parser;

use postgres_mcp_gateway::cli;
use postgres_mcp_gateway::infra;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::Cli::parse();

    if let Some(command) = args.command {
        return cli::run_commands(command).await;
    }

    // Configuration comes first: logging level and format live in it, and an
    // invalid config must halt the process before anything serves.
    let cfg = match infra::config::AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    infra::logging::init(&cfg.logging);

    match infra::boot::run(cfg).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            ExitCode::FAILURE
        }
    }
}
