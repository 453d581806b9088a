//! Studio configuration parsed from environment variables.

use tracing::debug;

use crate::error::ErrorCode;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_HISTORY_DEPTH: usize = canvas::consts::DEFAULT_HISTORY_DEPTH;

/// Errors produced while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The API base URL is not an absolute http(s) URL.
    #[error("invalid STUDIO_API_BASE_URL '{0}': expected an http:// or https:// URL")]
    InvalidBaseUrl(String),
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidBaseUrl(_) => "E_CONFIG_BASE_URL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioConfig {
    /// REST base URL without a trailing slash.
    pub api_base_url: String,
    /// Bearer token forwarded on every request, if set.
    pub api_token: Option<String>,
    pub timeouts: Timeouts,
    /// Maximum number of undo entries kept by the canvas.
    pub history_depth: usize,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            timeouts: Timeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
            history_depth: DEFAULT_HISTORY_DEPTH,
        }
    }
}

impl StudioConfig {
    /// Seed the environment from a `.env` file when one exists, then read it.
    ///
    /// # Errors
    ///
    /// See [`StudioConfig::from_env`].
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded .env"),
            Err(e) => debug!(error = %e, "no .env loaded"),
        }
        Self::from_env()
    }

    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `STUDIO_API_BASE_URL`: default `http://localhost:8080/api`
    /// - `STUDIO_API_TOKEN`: bearer token, unset by default
    /// - `STUDIO_REQUEST_TIMEOUT_SECS`: default 30
    /// - `STUDIO_CONNECT_TIMEOUT_SECS`: default 10
    /// - `STUDIO_HISTORY_DEPTH`: default 200
    ///
    /// Unparseable numbers fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the base URL is not http(s).
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = parse_base_url(std::env::var("STUDIO_API_BASE_URL").ok().as_deref())?;
        let api_token = std::env::var("STUDIO_API_TOKEN").ok().filter(|t| !t.trim().is_empty());
        let timeouts = Timeouts {
            request_secs: env_parse("STUDIO_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("STUDIO_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let history_depth = env_parse("STUDIO_HISTORY_DEPTH", DEFAULT_HISTORY_DEPTH).max(1);

        Ok(Self { api_base_url, api_token, timeouts, history_depth })
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_base_url(raw: Option<&str>) -> Result<String, ConfigError> {
    let url = raw.map_or(DEFAULT_API_BASE_URL, str::trim).trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_string())
    } else {
        Err(ConfigError::InvalidBaseUrl(url.to_string()))
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
