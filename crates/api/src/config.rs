//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Server and consumer configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `RETRY_MAX_ATTEMPTS` — delivery attempts before dead-lettering (default: `5`)
/// - `RETRY_BASE_DELAY_MS` — first retry backoff in milliseconds (default: `100`)
/// - `DEDUP_RETENTION_SECS` — how long processed event IDs are remembered
///   (default: `86400`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub retry_max_attempts: u32,
    pub retry_base_delay: Duration,
    pub dedup_retention: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_parse("PORT").unwrap_or(defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            retry_max_attempts: env_parse("RETRY_MAX_ATTEMPTS")
                .unwrap_or(defaults.retry_max_attempts),
            retry_base_delay: env_parse("RETRY_BASE_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_base_delay),
            dedup_retention: env_parse("DEDUP_RETENTION_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.dedup_retention),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            retry_max_attempts: 5,
            retry_base_delay: Duration::from_millis(100),
            dedup_retention: Duration::from_secs(24 * 60 * 60),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.retry_max_attempts, 5);
        assert_eq!(config.retry_base_delay, Duration::from_millis(100));
        assert_eq!(config.dedup_retention, Duration::from_secs(86400));
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
}
