//! Connection configuration for the PASS repository
//!
//! The client itself never reads the environment; binaries (and
//! `PassClient::from_env`) build a [`PassConfig`] here and hand it over.

use crate::error::{CommonError, Result};
use serde::{Deserialize, Serialize};
use url::Url;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default PASS repository URL for local development.
pub const DEFAULT_PASS_CORE_URL: &str = "http://localhost:8080/";

/// Environment variable holding the repository base URL.
pub const ENV_PASS_CORE_URL: &str = "PASS_CORE_URL";

/// Environment variable holding the basic-auth user.
pub const ENV_PASS_CORE_USER: &str = "PASS_CORE_USER";

/// Environment variable holding the basic-auth password.
pub const ENV_PASS_CORE_PASSWORD: &str = "PASS_CORE_PASSWORD";

/// Environment variable holding the transport timeout in seconds.
pub const ENV_PASS_CLIENT_TIMEOUT_SECS: &str = "PASS_CLIENT_TIMEOUT_SECS";

/// Connection settings for a PASS repository
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PassConfig {
    /// Base URL of the repository; `data/{type}` is resolved against it
    pub base_url: String,

    /// Basic-auth user
    #[serde(default)]
    pub user: Option<String>,

    /// Basic-auth password
    #[serde(default)]
    pub password: Option<String>,

    /// Transport timeout; `None` keeps the HTTP transport default
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl PassConfig {
    /// Create a config for `base_url` without credentials
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user: None,
            password: None,
            timeout_secs: None,
        }
    }

    /// Set basic-auth credentials
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    /// Set the transport timeout
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Load configuration from environment variables (and `.env`, if present)
    ///
    /// Environment variables:
    /// - `PASS_CORE_URL`: repository base URL
    /// - `PASS_CORE_USER` / `PASS_CORE_PASSWORD`: basic-auth credentials
    /// - `PASS_CLIENT_TIMEOUT_SECS`: transport timeout in seconds
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let timeout_secs = match std::env::var(ENV_PASS_CLIENT_TIMEOUT_SECS) {
            Ok(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                CommonError::config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_PASS_CLIENT_TIMEOUT_SECS, raw
                ))
            })?),
            Err(_) => None,
        };

        let config = Self {
            base_url: std::env::var(ENV_PASS_CORE_URL)
                .unwrap_or_else(|_| DEFAULT_PASS_CORE_URL.to_string()),
            user: std::env::var(ENV_PASS_CORE_USER).ok().filter(|s| !s.is_empty()),
            password: std::env::var(ENV_PASS_CORE_PASSWORD).ok().filter(|s| !s.is_empty()),
            timeout_secs,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(CommonError::config("PASS base URL cannot be empty"));
        }

        let url = Url::parse(&self.base_url)
            .map_err(|e| CommonError::config(format!("Invalid PASS base URL '{}': {}", self.base_url, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(CommonError::config(format!(
                "PASS base URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.user.is_some() != self.password.is_some() {
            tracing::warn!("Only one of user/password is set; requests will be sent without credentials");
        }

        Ok(())
    }

    /// Credentials, when both user and password are present
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.user, &self.password) {
            (Some(user), Some(password)) => Some((user.as_str(), password.as_str())),
            _ => None,
        }
    }
}

impl Default for PassConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PASS_CORE_URL)
    }
}

impl std::fmt::Debug for PassConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassConfig")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
