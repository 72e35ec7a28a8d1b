//! Application configuration loaded from environment variables.

use std::time::Duration;

use domain::{DEFAULT_LOW_STOCK_THRESHOLD, RetryPolicy};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `"text"` or `"json"` (default: `"text"`)
/// - `DATABASE_URL`: PostgreSQL connection string; in-memory stores when unset
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `10`)
/// - `STOCK_RETRY_MAX_ATTEMPTS`: compare-and-set attempts per update (default: `5`)
/// - `STOCK_RETRY_BACKOFF_MS`: first retry delay (default: `5`)
/// - `STOCK_RETRY_MAX_BACKOFF_MS`: retry delay cap (default: `200`)
/// - `LOW_STOCK_THRESHOLD`: inventory report cut-off (default: `10`)
///
/// Unparseable numbers fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub retry_max_attempts: u32,
    pub retry_backoff_ms: u64,
    pub retry_max_backoff_ms: u64,
    pub low_stock_threshold: u32,
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map(|f| LogFormat::parse(&f))
                .unwrap_or_default(),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            database_max_connections: number("DATABASE_MAX_CONNECTIONS")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.database_max_connections),
            retry_max_attempts: number("STOCK_RETRY_MAX_ATTEMPTS")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.retry_max_attempts),
            retry_backoff_ms: number("STOCK_RETRY_BACKOFF_MS").unwrap_or(defaults.retry_backoff_ms),
            retry_max_backoff_ms: number("STOCK_RETRY_MAX_BACKOFF_MS")
                .unwrap_or(defaults.retry_max_backoff_ms),
            low_stock_threshold: number("LOW_STOCK_THRESHOLD")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.low_stock_threshold),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Retry policy for compare-and-set updates in the ledger and order store.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_max_attempts,
            Duration::from_millis(self.retry_backoff_ms),
            Duration::from_millis(self.retry_max_backoff_ms),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            database_max_connections: 10,
            retry_max_attempts: retry.max_attempts,
            retry_backoff_ms: retry.initial_backoff.as_millis() as u64,
            retry_max_backoff_ms: retry.max_backoff.as_millis() as u64,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.database_url, None);
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.retry_max_attempts, 5);
        assert_eq!(config.retry_backoff_ms, 5);
        assert_eq!(config.retry_max_backoff_ms, 200);
        assert_eq!(config.low_stock_threshold, 10);
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        assert_eq!(config_from(&[]), Config::default());
    }

    #[test]
    fn test_reads_every_variable() {
        let config = config_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("RUST_LOG", "debug"),
            ("LOG_FORMAT", "JSON"),
            ("DATABASE_URL", "postgres://localhost/warehouse"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("STOCK_RETRY_MAX_ATTEMPTS", "9"),
            ("STOCK_RETRY_BACKOFF_MS", "1"),
            ("STOCK_RETRY_MAX_BACKOFF_MS", "50"),
            ("LOW_STOCK_THRESHOLD", "3"),
        ]);

        assert_eq!(config.addr(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/warehouse")
        );
        assert_eq!(config.database_max_connections, 4);
        assert_eq!(config.low_stock_threshold, 3);

        let retry = config.retry_policy();
        assert_eq!(retry.max_attempts, 9);
        assert_eq!(retry.initial_backoff, Duration::from_millis(1));
        assert_eq!(retry.max_backoff, Duration::from_millis(50));
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = config_from(&[("PORT", "http"), ("LOW_STOCK_THRESHOLD", "-1")]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.low_stock_threshold, 10);
    }

    #[test]
    fn test_blank_database_url_means_in_memory() {
        assert_eq!(config_from(&[("DATABASE_URL", "  ")]).database_url, None);
    }

    #[test]
    fn test_addr_default() {
        let config = Config::default();
        assert_eq!(config.addr(), "0.0.0.0:3000");
    }
}
