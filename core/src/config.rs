//! Client configuration, optionally populated from environment variables.

use std::time::Duration;

use crate::error::ConfigError;

/// Connection settings for a `GorseClient`.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `GORSE_ENDPOINT` | (required) | Base URL of the service, e.g. `http://127.0.0.1:8087` |
/// | `GORSE_API_KEY` | empty | Sent as `X-API-Key` when non-empty |
/// | `GORSE_TIMEOUT_SECS` | (absent = no timeout) | Upper bound for each call |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Used verbatim as the prefix of every route.
    pub base_url: String,
    pub api_key: String,
    /// Default per-call timeout. `None` waits as long as the transport does.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            timeout: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Populate config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("GORSE_ENDPOINT").ok_or(ConfigError::MissingVar("GORSE_ENDPOINT"))?;
        let api_key = lookup("GORSE_API_KEY").unwrap_or_default();
        let timeout = match lookup("GORSE_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "GORSE_TIMEOUT_SECS",
                    value: raw.clone(),
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };
        Ok(Self {
            base_url,
            api_key,
            timeout,
        })
    }
}
