//! Gateway configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_AUTOSAVE_DEBOUNCE_MS: u64 = 1500;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("missing config: env var {var} not set")]
    Missing { var: String },

    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub api_base_url: String,
    pub timeouts: Timeouts,
    pub autosave_debounce_ms: u64,
}

impl GatewayConfig {
    /// Build typed gateway config from environment variables.
    ///
    /// Required:
    /// - `GEOPLAN_API_BASE_URL`
    ///
    /// Optional:
    /// - `GEOPLAN_REQUEST_TIMEOUT_SECS`: default 120
    /// - `GEOPLAN_CONNECT_TIMEOUT_SECS`: default 10
    /// - `GEOPLAN_AUTOSAVE_DEBOUNCE_MS`: default 1500
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the base URL is missing or not an http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = std::env::var("GEOPLAN_API_BASE_URL")
            .map_err(|_| ConfigError::Missing { var: "GEOPLAN_API_BASE_URL".into() })?;
        let api_base_url = parse_base_url(&raw)?;
        let timeouts = Timeouts {
            request_secs: env_parse("GEOPLAN_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("GEOPLAN_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let autosave_debounce_ms = env_parse("GEOPLAN_AUTOSAVE_DEBOUNCE_MS", DEFAULT_AUTOSAVE_DEBOUNCE_MS);

        Ok(Self { api_base_url, timeouts, autosave_debounce_ms })
    }

    #[must_use]
    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::Parse(format!("GEOPLAN_API_BASE_URL must be an http(s) URL, got '{raw}'")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
