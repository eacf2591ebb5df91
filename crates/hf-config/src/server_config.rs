use crate::{ConfigError, ConfigErrorResult, DEFAULT_BASE_URL, DEFAULT_COOKIE_NAME};

use std::time::Duration;

use serde::Deserialize;

pub const MIN_REQUEST_TIMEOUT_SECS: u64 = 1;
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where the session and favorites endpoints live.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the listing site (e.g. "http://127.0.0.1:8080")
    pub base_url: String,
    /// Name of the cookie carrying the session token
    pub cookie_name: String,
    /// Per-request timeout for every authority call
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            cookie_name: String::from(DEFAULT_COOKIE_NAME),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::server(format!(
                "server.base_url must start with http:// or https://, got {:?}",
                self.base_url
            )));
        }

        if self.cookie_name.trim().is_empty()
            || self
                .cookie_name
                .chars()
                .any(|c| c.is_whitespace() || c == '=' || c == ';')
        {
            return Err(ConfigError::server(format!(
                "server.cookie_name must be a non-empty cookie token, got {:?}",
                self.cookie_name
            )));
        }

        if self.request_timeout_secs < MIN_REQUEST_TIMEOUT_SECS
            || self.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS
        {
            return Err(ConfigError::server(format!(
                "server.request_timeout_secs must be {}-{}, got {}",
                MIN_REQUEST_TIMEOUT_SECS, MAX_REQUEST_TIMEOUT_SECS, self.request_timeout_secs
            )));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
