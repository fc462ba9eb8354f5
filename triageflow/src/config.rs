//! Client configuration.
//!
//! Values are resolved once at startup, either from a serialized document or
//! from the process environment, and then passed by reference to sessions and
//! presenters.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ConfigError;

/// Environment variable holding the backend base URL.
pub const ENV_BASE_URL: &str = "TRIAGEFLOW_BASE_URL";
/// Environment variable holding the poll interval in milliseconds.
pub const ENV_POLL_INTERVAL_MS: &str = "TRIAGEFLOW_POLL_INTERVAL_MS";
/// Environment variable holding the request timeout in seconds.
pub const ENV_REQUEST_TIMEOUT: &str = "TRIAGEFLOW_REQUEST_TIMEOUT_SECONDS";
/// Environment variable holding the external ticket tracker base URL.
pub const ENV_EXTERNAL_BASE_URL: &str = "JIRA_BASE_URL";

/// Configuration for talking to the workflow backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the workflow backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Delay between status polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Timeout applied to every request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: f64,
    /// Base URL for external ticket links (e.g. `https://acme.atlassian.net`).
    #[serde(default)]
    pub external_base_url: Option<String>,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_request_timeout() -> f64 {
    30.0
}

fn default_user_agent() -> String {
    concat!("triageflow/", env!("CARGO_PKG_VERSION")).to_string()
}

fn timeout_from_seconds(seconds: f64) -> Result<Duration, ConfigError> {
    match Duration::try_from_secs_f64(seconds) {
        Ok(timeout) if !timeout.is_zero() => Ok(timeout),
        _ => Err(ConfigError::InvalidTimeout {
            value: seconds.to_string(),
        }),
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_seconds: default_request_timeout(),
            external_base_url: None,
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves configuration from the process environment.
    ///
    /// Unset variables fall back to defaults; blank values count as unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(base_url) = get(ENV_BASE_URL) {
            config.base_url = base_url.trim().to_string();
        }
        if let Some(raw) = get(ENV_POLL_INTERVAL_MS) {
            config.poll_interval_ms = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_POLL_INTERVAL_MS.to_string(),
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = get(ENV_REQUEST_TIMEOUT) {
            let invalid = || ConfigError::InvalidEnv {
                name: ENV_REQUEST_TIMEOUT.to_string(),
                value: raw.clone(),
            };
            let seconds: f64 = raw.trim().parse().map_err(|_| invalid())?;
            timeout_from_seconds(seconds).map_err(|_| invalid())?;
            config.request_timeout_seconds = seconds;
        }
        config.external_base_url = get(ENV_EXTERNAL_BASE_URL).map(|url| url.trim().to_string());

        Ok(config)
    }

    /// Sets the backend base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.request_timeout_seconds = seconds;
        self
    }

    /// Sets the external ticket base URL.
    #[must_use]
    pub fn with_external_base_url(mut self, url: impl Into<String>) -> Self {
        self.external_base_url = Some(url.into());
        self
    }

    /// Gets the poll interval as a Duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Gets the request timeout as a Duration.
    ///
    /// Fails unless the configured value is a positive, representable number
    /// of seconds.
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        timeout_from_seconds(self.request_timeout_seconds)
    }

    /// Joins a path onto the backend base URL.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
