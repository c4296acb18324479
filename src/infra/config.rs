//! Configuration: `config.toml` in the working directory (path overridable
//! via `CONFIG_PATH`) overlaid with environment variables; the environment
//! wins. Every knob has a default, so a missing file is not an error while
//! an unparseable one is.

use serde::Deserialize;

use crate::core::error::McpError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// "server" (HTTP) or "stdio".
    pub mode: String,
    pub port: u16,
    pub enable_postgres: bool,
    pub postgres: PostgresConfig,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: "server".into(),
            port: 8080,
            enable_postgres: true,
            postgres: PostgresConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub schema: String,
    pub max_connections: usize,
    pub connect_timeout_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5432,
            database: "postgres".into(),
            user: "postgres".into(),
            password: String::new(),
            schema: "public".into(),
            max_connections: 10,
            connect_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    /// "json" or "text".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "json".into(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, McpError> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".into());
        let mut cfg = match std::fs::read_to_string(&path) {
            Ok(text) => toml::from_str::<AppConfig>(&text)
                .map_err(|e| McpError::configuration(format!("invalid {path}: {e}")))?,
            Err(_) => AppConfig::default(),
        };
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        env_string("MODE", &mut self.mode);
        env_parse("PORT", &mut self.port);
        env_bool("ENABLE_POSTGRES", &mut self.enable_postgres);

        env_string("PGHOST", &mut self.postgres.host);
        env_parse("PGPORT", &mut self.postgres.port);
        env_string("PGDATABASE", &mut self.postgres.database);
        env_string("PGUSER", &mut self.postgres.user);
        env_string("PGPASSWORD", &mut self.postgres.password);
        env_string("PGSCHEMA", &mut self.postgres.schema);
        env_parse("PG_MAX_CONNECTIONS", &mut self.postgres.max_connections);
        env_parse("PG_CONNECTION_TIMEOUT_MS", &mut self.postgres.connect_timeout_ms);

        env_string("LOG_LEVEL", &mut self.logging.level);
        env_string("LOG_FORMAT", &mut self.logging.format);
    }

    fn validate(&self) -> Result<(), McpError> {
        if !matches!(self.mode.as_str(), "server" | "stdio") {
            return Err(McpError::configuration(format!(
                "invalid mode '{}': must be 'server' or 'stdio'",
                self.mode
            )));
        }
        if self.mode == "server" && self.port == 0 {
            return Err(McpError::configuration("port cannot be 0"));
        }
        if self.enable_postgres {
            for (knob, value) in [
                ("postgres.host", &self.postgres.host),
                ("postgres.database", &self.postgres.database),
                ("postgres.user", &self.postgres.user),
                ("postgres.schema", &self.postgres.schema),
            ] {
                if value.is_empty() {
                    return Err(McpError::configuration(format!("{knob} is required")));
                }
            }
            if self.postgres.max_connections == 0 || self.postgres.max_connections > 100 {
                return Err(McpError::configuration(
                    "postgres.max_connections must be between 1 and 100",
                ));
            }
        }
        if !matches!(
            self.logging.level.as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            return Err(McpError::configuration(format!(
                "invalid logging.level '{}'",
                self.logging.level
            )));
        }
        if !matches!(self.logging.format.as_str(), "json" | "text") {
            return Err(McpError::configuration(format!(
                "invalid logging.format '{}': must be 'json' or 'text'",
                self.logging.format
            )));
        }
        Ok(())
    }
}

fn env_string(key: &str, slot: &mut String) {
    if let Ok(value) = std::env::var(key) {
        if !value.is_empty() {
            *slot = value;
        }
    }
}

// Unparseable numeric env values fall back to the file/default value.
fn env_parse<T: std::str::FromStr>(key: &str, slot: &mut T) {
    if let Ok(value) = std::env::var(key) {
        if let Ok(parsed) = value.parse::<T>() {
            *slot = parsed;
        }
    }
}

fn env_bool(key: &str, slot: &mut bool) {
    if let Ok(value) = std::env::var(key) {
        *slot = matches!(value.to_lowercase().as_str(), "true" | "1");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const ALL_VARS: &[&str] = &[
        "CONFIG_PATH",
        "MODE",
        "PORT",
        "ENABLE_POSTGRES",
        "PGHOST",
        "PGPORT",
        "PGDATABASE",
        "PGUSER",
        "PGPASSWORD",
        "PGSCHEMA",
        "PG_MAX_CONNECTIONS",
        "PG_CONNECTION_TIMEOUT_MS",
        "LOG_LEVEL",
        "LOG_FORMAT",
    ];

    fn clear_env() {
        for var in ALL_VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn defaults_apply_without_file_or_env() {
        clear_env();
        env::set_var("CONFIG_PATH", "/nonexistent/config.toml");
        let cfg = AppConfig::load().unwrap();
        assert_eq!(cfg.mode, "server");
        assert_eq!(cfg.port, 8080);
        assert!(cfg.enable_postgres);
        assert_eq!(cfg.postgres.host, "localhost");
        assert_eq!(cfg.postgres.port, 5432);
        assert_eq!(cfg.postgres.schema, "public");
        assert_eq!(cfg.postgres.max_connections, 10);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.logging.format, "json");
        clear_env();
    }

    #[test]
    #[serial]
    fn environment_overrides_defaults() {
        clear_env();
        env::set_var("CONFIG_PATH", "/nonexistent/config.toml");
        env::set_var("MODE", "stdio");
        env::set_var("PGHOST", "db.internal");
        env::set_var("PGPORT", "6432");
        env::set_var("ENABLE_POSTGRES", "false");
        env::set_var("LOG_FORMAT", "text");
        let cfg = AppConfig::load().unwrap();
        assert_eq!(cfg.mode, "stdio");
        assert_eq!(cfg.postgres.host, "db.internal");
        assert_eq!(cfg.postgres.port, 6432);
        assert!(!cfg.enable_postgres);
        assert_eq!(cfg.logging.format, "text");
        clear_env();
    }

    #[test]
    #[serial]
    fn environment_overrides_file_values() {
        clear_env();
        let path = std::env::temp_dir().join(format!("pgmcp-cfg-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "port = 9999\n\n[postgres]\nhost = \"file-host\"\ndatabase = \"filedb\"\n",
        )
        .unwrap();
        env::set_var("CONFIG_PATH", &path);
        env::set_var("PGHOST", "env-host");

        let cfg = AppConfig::load().unwrap();
        assert_eq!(cfg.port, 9999);
        assert_eq!(cfg.postgres.host, "env-host");
        assert_eq!(cfg.postgres.database, "filedb");

        std::fs::remove_file(&path).ok();
        clear_env();
    }

    #[test]
    #[serial]
    fn unparseable_file_is_a_configuration_error() {
        clear_env();
        let path = std::env::temp_dir().join(format!("pgmcp-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "port = \"not a number").unwrap();
        env::set_var("CONFIG_PATH", &path);

        let err = AppConfig::load().unwrap_err();
        assert!(err.is_kind(crate::core::error::ErrorKind::Configuration));

        std::fs::remove_file(&path).ok();
        clear_env();
    }

    #[test]
    #[serial]
    fn invalid_mode_is_rejected() {
        clear_env();
        env::set_var("CONFIG_PATH", "/nonexistent/config.toml");
        env::set_var("MODE", "carrier-pigeon");
        let err = AppConfig::load().unwrap_err();
        assert!(err.message.contains("invalid mode"));
        clear_env();
    }

    #[test]
    #[serial]
    fn non_numeric_port_env_falls_back() {
        clear_env();
        env::set_var("CONFIG_PATH", "/nonexistent/config.toml");
        env::set_var("PORT", "abc");
        let cfg = AppConfig::load().unwrap();
        assert_eq!(cfg.port, 8080);
        clear_env();
    }

    #[test]
    #[serial]
    fn out_of_range_pool_size_is_rejected() {
        clear_env();
        env::set_var("CONFIG_PATH", "/nonexistent/config.toml");
        env::set_var("PG_MAX_CONNECTIONS", "500");
        let err = AppConfig::load().unwrap_err();
        assert!(err.message.contains("max_connections"));
        clear_env();
    }

    #[test]
    #[serial]
    fn invalid_log_format_is_rejected() {
        clear_env();
        env::set_var("CONFIG_PATH", "/nonexistent/config.toml");
        env::set_var("LOG_FORMAT", "xml");
        let err = AppConfig::load().unwrap_err();
        assert!(err.message.contains("logging.format"));
        clear_env();
    }
}
