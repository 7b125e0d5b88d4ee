//! Application configuration loaded from environment variables.

use std::time::Duration;

use health::ReporterOptions;

/// Deployment mode, read from `NODE_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    /// Parses a `NODE_ENV` value. Anything unrecognised, including an unset
    /// variable, is treated as production.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("development") => Self::Development,
            Some("test") => Self::Test,
            _ => Self::Production,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }
}

/// Log output format, read from `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `5000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT` — `json` for JSON logs, anything else for text
/// - `NODE_ENV` — deployment mode; `development` adds free memory to health reports
/// - `DATABASE_URL` — Postgres connection string (optional)
/// - `DB_PING_INTERVAL_SECS` — seconds between database probes (default: `10`)
/// - `DB_PING_TIMEOUT_SECS` — seconds before a probe counts as failed (default: `2`)
/// - `CORS_ORIGIN` — origin allowed to send credentialed requests (optional)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub environment: Environment,
    pub database_url: Option<String>,
    pub db_ping_interval: Duration,
    pub db_ping_timeout: Duration,
    pub cors_origin: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults for
    /// missing or unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let seconds = |key: &str, default: Duration| {
            non_empty(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(default)
        };

        Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port: non_empty("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            log_level: non_empty("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: match non_empty("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
            environment: Environment::parse(lookup("NODE_ENV").as_deref()),
            database_url: non_empty("DATABASE_URL"),
            db_ping_interval: seconds("DB_PING_INTERVAL_SECS", defaults.db_ping_interval),
            db_ping_timeout: seconds("DB_PING_TIMEOUT_SECS", defaults.db_ping_timeout),
            cors_origin: non_empty("CORS_ORIGIN"),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Health report options for this deployment.
    pub fn reporter_options(&self) -> ReporterOptions {
        ReporterOptions::with_free_memory(self.environment == Environment::Development)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            environment: Environment::Production,
            database_url: None,
            db_ping_interval: Duration::from_secs(10),
            db_ping_timeout: Duration::from_secs(2),
            cors_origin: None,
        }
    }
}
