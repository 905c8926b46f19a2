//! Client configuration, read from the environment after `.env` is loaded.

use std::env;
use std::time::Duration;

use hypertension_care_data::database::{DatabaseError, StoreConfig};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

/// Backend base URL used when `API_BASE_URL` is not set
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

/// Request timeout used when `REQUEST_TIMEOUT_SECONDS` is not set
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error(transparent)]
    Store(#[from] DatabaseError),
}

/// Everything the client needs to talk to the backend and persist the session
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every endpoint path is resolved against
    pub api_base_url: Url,

    pub request_timeout: Duration,

    /// Serve placeholder analytics and anomalies when the backend call fails
    pub analytics_mock_fallback: bool,

    pub store: StoreConfig,
}

impl ClientConfig {
    /// Configuration for `base_url` with defaults everywhere else and an in-memory store
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url(base_url)?,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            analytics_mock_fallback: false,
            store: StoreConfig::in_memory(),
        })
    }

    /// Read `API_BASE_URL`, `REQUEST_TIMEOUT_SECONDS`, `ANALYTICS_MOCK_FALLBACK` and the
    /// session store variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env::var("API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = parse_base_url(&base_url)?;

        let request_timeout = match env::var("REQUEST_TIMEOUT_SECONDS") {
            Ok(value) => {
                let seconds = value
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|s| *s > 0)
                    .ok_or(ConfigError::InvalidValue {
                        name: "REQUEST_TIMEOUT_SECONDS",
                        value: value.clone(),
                    })?;
                Duration::from_secs(seconds)
            }
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        };

        let analytics_mock_fallback = match env::var("ANALYTICS_MOCK_FALLBACK") {
            Ok(value) => parse_flag(&value).ok_or(ConfigError::InvalidValue {
                name: "ANALYTICS_MOCK_FALLBACK",
                value,
            })?,
            Err(_) => false,
        };

        if analytics_mock_fallback {
            warn!("Analytics mock fallback is enabled; failed analytics calls will show placeholder data");
        }

        let store = StoreConfig::from_env()?;

        info!("Using backend at {}", api_base_url);

        Ok(Self {
            api_base_url,
            request_timeout,
            analytics_mock_fallback,
            store,
        })
    }
}

/// Parse and normalise a base URL so relative endpoint paths join beneath it
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let url = parse_base_url("http://localhost:5000/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/");
        assert_eq!(
            url.join("bp/readings").unwrap().as_str(),
            "http://localhost:5000/api/bp/readings"
        );

        let url = parse_base_url("https://example.org").unwrap();
        assert_eq!(url.as_str(), "https://example.org/");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            parse_base_url("not a url"),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert!(parse_base_url("ftp://example.org/api").is_err());
    }

    #[test]
    fn test_flag_parsing() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_new_uses_defaults() {
        let config = ClientConfig::new(DEFAULT_API_BASE_URL).unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(!config.analytics_mock_fallback);
        assert!(config.store.path.is_none());
    }
}
