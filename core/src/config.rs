//! Client configuration.
//!
//! Defaults target the public Google Books endpoint. Every value can be
//! overridden through `BOOKS_*` environment variables; binaries load a `.env`
//! file with `dotenvy` before calling `ClientConfig::from_env`.

use std::time::Duration;

use crate::error::ApiError;
use crate::types::PLACEHOLDER_COVER_URL;

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/books/v1/volumes";
pub const DEFAULT_MAX_RESULTS: u32 = 15;
/// Upper bound the volumes endpoint accepts for `maxResults`.
pub const MAX_RESULTS_LIMIT: u32 = 40;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_COVER_WORKERS: usize = 4;

pub const ENV_API_URL: &str = "BOOKS_API_URL";
pub const ENV_MAX_RESULTS: &str = "BOOKS_MAX_RESULTS";
pub const ENV_PLACEHOLDER_URL: &str = "BOOKS_PLACEHOLDER_URL";
pub const ENV_CONNECT_TIMEOUT: &str = "BOOKS_CONNECT_TIMEOUT_SECS";
pub const ENV_READ_TIMEOUT: &str = "BOOKS_READ_TIMEOUT_SECS";
pub const ENV_COVER_WORKERS: &str = "BOOKS_COVER_WORKERS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub max_results: u32,
    pub placeholder_cover_url: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub cover_workers: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            placeholder_cover_url: PLACEHOLDER_COVER_URL.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            cover_workers: DEFAULT_COVER_WORKERS,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by any `BOOKS_*` variables set in the process
    /// environment.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_API_URL) {
            config.base_url = url;
        }
        if let Some(url) = lookup(ENV_PLACEHOLDER_URL) {
            config.placeholder_cover_url = url;
        }
        if let Some(raw) = lookup(ENV_MAX_RESULTS) {
            config.max_results = parse_number(ENV_MAX_RESULTS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_CONNECT_TIMEOUT) {
            config.connect_timeout = Duration::from_secs(parse_number(ENV_CONNECT_TIMEOUT, &raw)?);
        }
        if let Some(raw) = lookup(ENV_READ_TIMEOUT) {
            config.read_timeout = Duration::from_secs(parse_number(ENV_READ_TIMEOUT, &raw)?);
        }
        if let Some(raw) = lookup(ENV_COVER_WORKERS) {
            config.cover_workers = parse_number(ENV_COVER_WORKERS, &raw)?;
        }
        Ok(config.normalized())
    }

    /// Clamp values into the ranges the client supports.
    pub fn normalized(mut self) -> Self {
        self.max_results = normalize_max_results(self.max_results);
        self.cover_workers = self.cover_workers.max(1);
        self
    }
}

pub fn normalize_max_results(max_results: u32) -> u32 {
    max_results.clamp(1, MAX_RESULTS_LIMIT)
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::Config(format!("{key} must be a non-negative integer, got {raw:?}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.max_results, 15);
        assert_eq!(config.connect_timeout, Duration::from_secs(15));
        assert_eq!(config.read_timeout, Duration::from_secs(10));
    }

    #[test]
    fn variables_override_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_API_URL, "http://127.0.0.1:3000/books/v1/volumes"),
            (ENV_MAX_RESULTS, "5"),
            (ENV_READ_TIMEOUT, " 2 "),
            (ENV_COVER_WORKERS, "8"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:3000/books/v1/volumes");
        assert_eq!(config.max_results, 5);
        assert_eq!(config.read_timeout, Duration::from_secs(2));
        assert_eq!(config.cover_workers, 8);
    }

    #[test]
    fn max_results_is_clamped() {
        let config = ClientConfig::from_lookup(lookup(&[(ENV_MAX_RESULTS, "500")])).unwrap();
        assert_eq!(config.max_results, MAX_RESULTS_LIMIT);
        let config = ClientConfig::from_lookup(lookup(&[(ENV_MAX_RESULTS, "0")])).unwrap();
        assert_eq!(config.max_results, 1);
    }

    #[test]
    fn zero_workers_becomes_one() {
        let config = ClientConfig::from_lookup(lookup(&[(ENV_COVER_WORKERS, "0")])).unwrap();
        assert_eq!(config.cover_workers, 1);
    }

    #[test]
    fn bad_number_is_config_error() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_MAX_RESULTS, "lots")])).unwrap_err();
        assert!(matches!(err, ApiError::Config(msg) if msg.contains(ENV_MAX_RESULTS)));
    }
}
