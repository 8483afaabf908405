//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use queries::PageLimits;
use store::{DatabaseConfig, IsolationLevel, RetryPolicy};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`, `PORT`: bind address (default: `0.0.0.0:3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`, `DATABASE_MAX_CONNECTIONS`, `DATABASE_MIN_CONNECTIONS`,
///   `DATABASE_ACQUIRE_TIMEOUT_SECS`: connection pool
/// - `TX_MAX_RETRIES`, `TX_BASE_BACKOFF_MS`, `TX_MAX_BACKOFF_MS`: retry policy
/// - `TX_ISOLATION_LEVEL`: isolation for single-item workflows
/// - `PAGE_SIZE_DEFAULT`, `PAGE_SIZE_MAX`: listing limits
/// - `REQUEST_TIMEOUT_MS`: deadline handed to every write
///
/// Unparsable values fall back to their defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database: DatabaseConfig,
    pub retry: RetryPolicy,
    pub isolation: IsolationLevel,
    pub page_limits: PageLimits,
    pub request_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let millis = |key: &str| parse_var(&lookup, key).map(Duration::from_millis);

        let database = DatabaseConfig {
            url: lookup("DATABASE_URL").unwrap_or(defaults.database.url),
            max_connections: parse_var(&lookup, "DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.database.max_connections),
            min_connections: parse_var(&lookup, "DATABASE_MIN_CONNECTIONS")
                .unwrap_or(defaults.database.min_connections),
            acquire_timeout: parse_var(&lookup, "DATABASE_ACQUIRE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.database.acquire_timeout),
        };

        let retry = RetryPolicy {
            max_retries: parse_var(&lookup, "TX_MAX_RETRIES")
                .unwrap_or(defaults.retry.max_retries),
            base_backoff: millis("TX_BASE_BACKOFF_MS").unwrap_or(defaults.retry.base_backoff),
            max_backoff: millis("TX_MAX_BACKOFF_MS").or(defaults.retry.max_backoff),
        };

        let page_limits = PageLimits::new(
            parse_var(&lookup, "PAGE_SIZE_DEFAULT").unwrap_or(defaults.page_limits.default),
            parse_var(&lookup, "PAGE_SIZE_MAX").unwrap_or(defaults.page_limits.max),
        );

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT").unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            database,
            retry,
            isolation: parse_var(&lookup, "TX_ISOLATION_LEVEL").unwrap_or(defaults.isolation),
            page_limits,
            request_timeout: millis("REQUEST_TIMEOUT_MS").unwrap_or(defaults.request_timeout),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|value| value.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database: DatabaseConfig::default(),
            retry: RetryPolicy::default(),
            isolation: IsolationLevel::ReadCommitted,
            page_limits: PageLimits::default(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
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
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.isolation, IsolationLevel::ReadCommitted);
        assert_eq!(config.page_limits, PageLimits::new(20, 100));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_empty_environment_matches_defaults() {
        let config = from_pairs(&[]);
        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert_eq!(config.database.url, DatabaseConfig::default().url);
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn test_reads_every_variable() {
        let config = from_pairs(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8081"),
            ("RUST_LOG", "debug"),
            ("DATABASE_URL", "postgres://u:p@db:5432/shop"),
            ("DATABASE_MAX_CONNECTIONS", "32"),
            ("DATABASE_MIN_CONNECTIONS", "4"),
            ("DATABASE_ACQUIRE_TIMEOUT_SECS", "2"),
            ("TX_MAX_RETRIES", "7"),
            ("TX_BASE_BACKOFF_MS", "5"),
            ("TX_MAX_BACKOFF_MS", "200"),
            ("TX_ISOLATION_LEVEL", "repeatable_read"),
            ("PAGE_SIZE_DEFAULT", "50"),
            ("PAGE_SIZE_MAX", "500"),
            ("REQUEST_TIMEOUT_MS", "1500"),
        ]);

        assert_eq!(config.addr(), "127.0.0.1:8081");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.database.url, "postgres://u:p@db:5432/shop");
        assert_eq!(config.database.max_connections, 32);
        assert_eq!(config.database.min_connections, 4);
        assert_eq!(config.database.acquire_timeout, Duration::from_secs(2));
        assert_eq!(
            config.retry,
            RetryPolicy::new(7)
                .with_base_backoff(Duration::from_millis(5))
                .with_max_backoff(Duration::from_millis(200))
        );
        assert_eq!(config.isolation, IsolationLevel::RepeatableRead);
        assert_eq!(config.page_limits, PageLimits::new(50, 500));
        assert_eq!(config.request_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_unparsable_values_fall_back() {
        let config = from_pairs(&[
            ("PORT", "eighty"),
            ("TX_MAX_RETRIES", "-1"),
            ("TX_ISOLATION_LEVEL", "chaos"),
        ]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.isolation, IsolationLevel::ReadCommitted);
    }

    #[test]
    fn test_page_default_is_clamped_to_max() {
        let config = from_pairs(&[("PAGE_SIZE_DEFAULT", "80"), ("PAGE_SIZE_MAX", "30")]);
        assert_eq!(config.page_limits.default, 30);
        assert_eq!(config.page_limits.max, 30);
    }
}
