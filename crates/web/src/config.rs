//! Web configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `STAYBOOK_HOST` - Bind address (default: 127.0.0.1)
//! - `STAYBOOK_PORT` - Listen port (default: 3000)
//! - `STAYBOOK_BASE_URL` - Public URL of the site (default: <http://localhost:3000>)
//! - `STAYBOOK_API_URL` - Booking API base URL (default: <http://localhost:8000>)
//! - `STAYBOOK_SESSION_CAPACITY` - Most sessions held in memory (default: 10000)
//! - `STAYBOOK_SESSION_IDLE_MINUTES` - Idle time before a session is dropped (default: 120)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0 to 1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0 to 1.0 (default: 0.0)

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Web application configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the site
    pub base_url: String,
    /// Base URL of the booking API
    pub api_url: Url,
    /// Upper bound on sessions kept in memory
    pub session_capacity: u64,
    /// Minutes without a request before a session is dropped
    pub session_idle_minutes: u64,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

impl WebConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = parse_var("STAYBOOK_HOST", &get_or("STAYBOOK_HOST", "127.0.0.1"))?;
        let port = parse_var("STAYBOOK_PORT", &get_or("STAYBOOK_PORT", "3000"))?;
        let base_url = get_or("STAYBOOK_BASE_URL", "http://localhost:3000");
        let api_url = Url::parse(&get_or("STAYBOOK_API_URL", "http://localhost:8000"))
            .map_err(|e| ConfigError::InvalidEnvVar("STAYBOOK_API_URL".to_string(), e.to_string()))?;
        let session_capacity = parse_var(
            "STAYBOOK_SESSION_CAPACITY",
            &get_or("STAYBOOK_SESSION_CAPACITY", "10000"),
        )?;
        let session_idle_minutes = parse_var(
            "STAYBOOK_SESSION_IDLE_MINUTES",
            &get_or("STAYBOOK_SESSION_IDLE_MINUTES", "120"),
        )?;

        let sentry_sample_rate = lookup("SENTRY_SAMPLE_RATE")
            .map(|v| parse_rate("SENTRY_SAMPLE_RATE", &v))
            .transpose()?
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = lookup("SENTRY_TRACES_SAMPLE_RATE")
            .map(|v| parse_rate("SENTRY_TRACES_SAMPLE_RATE", &v))
            .transpose()?
            .unwrap_or(0.0);

        Ok(Self {
            host,
            port,
            base_url,
            api_url,
            session_capacity,
            session_idle_minutes,
            sentry_dsn: lookup("SENTRY_DSN").filter(|v| !v.trim().is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_rate(key: &str, value: &str) -> Result<f32, ConfigError> {
    let rate: f32 = parse_var(key, value)?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<WebConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        WebConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.api_url.as_str(), "http://localhost:8000/");
        assert!(!config.is_secure());
        assert!(config.sentry_dsn.is_none());
        assert_eq!(config.session_capacity, 10_000);
        assert_eq!(config.session_idle_minutes, 120);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("STAYBOOK_HOST", "0.0.0.0"),
            ("STAYBOOK_PORT", "8080"),
            ("STAYBOOK_BASE_URL", "https://staybook.example"),
            ("STAYBOOK_API_URL", "http://api.internal:9000"),
            ("SENTRY_TRACES_SAMPLE_RATE", "0.25"),
        ])
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.api_url.host_str(), Some("api.internal"));
        assert!(config.is_secure());
        assert!((config.sentry_traces_sample_rate - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[("STAYBOOK_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "STAYBOOK_PORT"));
    }

    #[test]
    fn test_invalid_api_url() {
        let err = load(&[("STAYBOOK_API_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "STAYBOOK_API_URL"));
    }

    #[test]
    fn test_invalid_session_capacity() {
        let err = load(&[("STAYBOOK_SESSION_CAPACITY", "-1")]).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "STAYBOOK_SESSION_CAPACITY")
        );
    }

    #[test]
    fn test_sample_rate_out_of_range() {
        assert!(load(&[("SENTRY_SAMPLE_RATE", "1.5")]).is_err());
    }

    #[test]
    fn test_blank_dsn_is_ignored() {
        let config = load(&[("SENTRY_DSN", "  ")]).unwrap();
        assert!(config.sentry_dsn.is_none());
    }
}
