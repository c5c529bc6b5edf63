//! Console configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `MIRAKI_API_BASE_URL` - Backend REST root (default: `http://localhost:3000/api/v1`)
//! - `MIRAKI_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `MIRAKI_STORAGE_PATH` - Credential file (default: `.miraki/credentials.json`)
//!
//! ## Query cache
//! - `MIRAKI_QUERY_RETRY` - Retries after a failed read (default: 3)
//! - `MIRAKI_QUERY_RETRY_DELAY_MS` - Base delay for exponential backoff (default: 1000)
//! - `MIRAKI_QUERY_STALE_SECS` - How long fetched data counts as fresh (default: 0)
//! - `MIRAKI_QUERY_GC_SECS` - Idle time before an entry is evicted (default: 300)
//! - `MIRAKI_QUERY_MAX_ENTRIES` - Cache capacity (default: 1000)
//! - `MIRAKI_REFETCH_ON_FOCUS` - Revalidate stale observed entries on focus (default: true)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api/v1";
const DEFAULT_STORAGE_PATH: &str = ".miraki/credentials.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Console client configuration.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Root of the REST API; resource paths are appended to it.
    pub api_base_url: Url,
    /// Timeout applied to every request.
    pub request_timeout: Duration,
    /// File holding the persisted token and user record.
    pub storage_path: PathBuf,
    /// Query cache behaviour.
    pub query: QueryConfig,
}

/// Query cache knobs.
///
/// Every behaviour that a reactive query library would apply implicitly is
/// spelled out here so runs are reproducible.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Retries after a failed read. Mutations are never retried.
    pub retry: u32,
    /// Base delay; attempt `n` waits `retry_delay * 2^n` plus jitter.
    pub retry_delay: Duration,
    /// Upper bound on a single backoff delay.
    pub max_retry_delay: Duration,
    /// How long successfully fetched data is served without refetching.
    pub stale_time: Duration,
    /// Idle time after which an unused entry is evicted.
    pub gc_time: Duration,
    /// Maximum number of cached keys.
    pub max_entries: u64,
    /// Whether [`on_focus`](crate::query::QueryCache::on_focus) revalidates.
    pub refetch_on_focus: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            retry: 3,
            retry_delay: Duration::from_millis(1000),
            max_retry_delay: Duration::from_secs(30),
            stale_time: Duration::ZERO,
            gc_time: Duration::from_secs(300),
            max_entries: 1000,
            refetch_on_focus: true,
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_base_url(),
            request_timeout: Duration::from_secs(10),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            query: QueryConfig::default(),
        }
    }
}

impl ConsoleConfig {
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

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = QueryConfig::default();

        let api_base_url = match lookup("MIRAKI_API_BASE_URL") {
            Some(raw) => parse_base_url(&raw)?,
            None => default_base_url(),
        };
        let request_timeout =
            Duration::from_secs(parse_or("MIRAKI_REQUEST_TIMEOUT_SECS", &lookup, 10)?);
        let storage_path = lookup("MIRAKI_STORAGE_PATH")
            .map_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH), PathBuf::from);

        let query = QueryConfig {
            retry: parse_or("MIRAKI_QUERY_RETRY", &lookup, defaults.retry)?,
            retry_delay: Duration::from_millis(parse_or(
                "MIRAKI_QUERY_RETRY_DELAY_MS",
                &lookup,
                1000,
            )?),
            max_retry_delay: defaults.max_retry_delay,
            stale_time: Duration::from_secs(parse_or("MIRAKI_QUERY_STALE_SECS", &lookup, 0)?),
            gc_time: Duration::from_secs(parse_or("MIRAKI_QUERY_GC_SECS", &lookup, 300)?),
            max_entries: parse_or("MIRAKI_QUERY_MAX_ENTRIES", &lookup, defaults.max_entries)?,
            refetch_on_focus: parse_or(
                "MIRAKI_REFETCH_ON_FOCUS",
                &lookup,
                defaults.refetch_on_focus,
            )?,
        };

        Ok(Self {
            api_base_url,
            request_timeout,
            storage_path,
            query,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

#[allow(clippy::expect_used)]
fn default_base_url() -> Url {
    Url::parse(DEFAULT_API_BASE_URL).expect("default base URL is valid")
}

/// Parse a base URL. Only `http` and `https` are accepted.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar("MIRAKI_API_BASE_URL".to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "MIRAKI_API_BASE_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// Parse an optional variable, falling back to a default when unset.
fn parse_or<T>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ConsoleConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://localhost:3000/api/v1");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.query.retry, 3);
        assert_eq!(config.query.stale_time, Duration::ZERO);
        assert!(config.query.refetch_on_focus);
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = ConsoleConfig::from_lookup(lookup_from(&[
            ("MIRAKI_API_BASE_URL", "https://api.miraki-art.com/v2"),
            ("MIRAKI_QUERY_RETRY", "0"),
            ("MIRAKI_QUERY_STALE_SECS", "30"),
            ("MIRAKI_REFETCH_ON_FOCUS", "false"),
            ("MIRAKI_STORAGE_PATH", "/tmp/creds.json"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url.as_str(), "https://api.miraki-art.com/v2");
        assert_eq!(config.query.retry, 0);
        assert_eq!(config.query.stale_time, Duration::from_secs(30));
        assert!(!config.query.refetch_on_focus);
        assert_eq!(config.storage_path, PathBuf::from("/tmp/creds.json"));
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = ConsoleConfig::from_lookup(lookup_from(&[("MIRAKI_QUERY_RETRY", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "MIRAKI_QUERY_RETRY"));
    }

    #[test]
    fn test_non_http_base_url_is_rejected() {
        let err = ConsoleConfig::from_lookup(lookup_from(&[(
            "MIRAKI_API_BASE_URL",
            "ftp://files.example.com",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }
}
