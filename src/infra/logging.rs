use crate::infra::config::LoggingConfig;

/// Install the global subscriber once, honoring RUST_LOG over the
/// configured level. Output goes to stderr: in stdio mode stdout is the
/// protocol channel and must carry only JSON-RPC frames.
pub fn init(cfg: &LoggingConfig) {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| cfg.level.clone());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    let _ = if cfg.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
