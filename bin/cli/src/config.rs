//! CLI configuration.
//!
//! Loaded via the `config` crate from `MAVEN_*` environment variables, e.g.
//! `MAVEN_API_BASE_URL` or `MAVEN_AUTH_TOKEN`.

use serde::Deserialize;
use std::time::Duration;

/// Settings for talking to the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    /// Root URL of the backend API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Bearer token. Requests fail locally without one.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Per-request timeout, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Interval between MT5 connectivity polls, in seconds.
    #[serde(default = "default_status_poll_interval_secs")]
    pub status_poll_interval_secs: u64,
}

fn default_api_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_status_poll_interval_secs() -> u64 {
    30
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            auth_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            status_poll_interval_secs: default_status_poll_interval_secs(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("MAVEN")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_secs(self.status_poll_interval_secs.max(1))
    }
}
