//! Client configuration from environment variables.
//!
//! | Variable           | Meaning                                   |
//! |--------------------|-------------------------------------------|
//! | `MWS_BASE_URL`     | required, `https://...` without query     |
//! | `MWS_USERNAME`     | optional, must come with `MWS_PASSWORD`   |
//! | `MWS_PASSWORD`     | optional, must come with `MWS_USERNAME`   |
//! | `MWS_TIMEOUT_SECS` | optional, whole seconds, default 10       |

use std::time::Duration;

use crate::client::{MwsClient, DEFAULT_TIMEOUT};
use crate::error::InvalidBaseUrl;
use crate::types::Credentials;

pub const BASE_URL_VAR: &str = "MWS_BASE_URL";
pub const USERNAME_VAR: &str = "MWS_USERNAME";
pub const PASSWORD_VAR: &str = "MWS_PASSWORD";
pub const TIMEOUT_VAR: &str = "MWS_TIMEOUT_SECS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("MWS_USERNAME and MWS_PASSWORD must be set together")]
    PartialCredentials,

    #[error("MWS_TIMEOUT_SECS must be a whole number of seconds, got '{0}'")]
    InvalidTimeout(String),

    #[error(transparent)]
    InvalidBaseUrl(#[from] InvalidBaseUrl),
}

/// Settings needed to build an `MwsClient`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub credentials: Option<Credentials>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which returns `None` for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup(BASE_URL_VAR).ok_or(ConfigError::Missing(BASE_URL_VAR))?;

        let credentials = match (lookup(USERNAME_VAR), lookup(PASSWORD_VAR)) {
            (Some(username), Some(password)) => Some(Credentials::new(username, password)),
            (None, None) => None,
            _ => return Err(ConfigError::PartialCredentials),
        };

        let timeout = match lookup(TIMEOUT_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidTimeout(raw))?,
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            base_url,
            credentials,
            timeout,
        })
    }

    /// Build a client using the default `ureq` transport.
    pub fn into_client(self) -> Result<MwsClient, ConfigError> {
        let client = MwsClient::new(&self.base_url)?.with_timeout(self.timeout);
        Ok(match self.credentials {
            Some(credentials) => client.with_credentials(credentials),
            None => client,
        })
    }
}
