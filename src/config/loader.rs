//! Runtime configuration loading.
//!
//! The backend base URL is resolved once at startup and injected into the
//! API client, instead of being read from the environment at every call
//! site. Sources, in precedence order: explicit CLI override, the
//! `IPSCOUT_API_URL` environment variable, a JSON config file in the user
//! config directory, and finally the built-in default.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default backend base URL when nothing else is configured.
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Default connect timeout in seconds for backend requests.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    format!("ipscout/{}", env!("CARGO_PKG_VERSION"))
}

/// Runtime configuration for ipscout.
///
/// # Example
///
/// ```ignore
/// let config = Config::load(cli.api_base)?;
/// let client = ApiClient::new(&config)?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the backend API, without a trailing slash
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Connect timeout for backend requests, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Resolve the effective configuration.
    ///
    /// `override_api_base` is the value of the `--api-base` flag; clap
    /// already folds the `IPSCOUT_API_URL` environment variable into it,
    /// so the precedence here is flag/env > config file > default.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed.
    /// A missing config file is not an error.
    pub fn load(override_api_base: Option<String>) -> Result<Self> {
        let mut config = Self::load_file()?.unwrap_or_default();

        if let Some(base) = override_api_base {
            config.api_base = base;
        }

        config.normalize();
        Ok(config)
    }

    /// Load the config file if one exists.
    fn load_file() -> Result<Option<Self>> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Self = serde_json::from_str(&content)?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(Some(config))
    }

    /// Parse a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid JSON.
    pub fn from_json(content: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(content)?;
        config.normalize();
        Ok(config)
    }

    /// Path of the user config file: `$CONFIG_DIR/ipscout/config.json`.
    #[must_use]
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ipscout")
            .join("config.json")
    }

    /// Strip trailing slashes so path joining is uniform.
    fn normalize(&mut self) {
        while self.api_base.ends_with('/') {
            self.api_base.pop();
        }
    }

    /// Join an endpoint path onto the base URL.
    ///
    /// `path` is expected to start with a slash, e.g. `/api/my-ip`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_base, "http://localhost:8000");
        assert_eq!(config.timeout_secs, 10);
        assert!(config.user_agent.starts_with("ipscout/"));
    }

    #[test]
    fn test_trailing_slash_normalized() {
        let mut config = Config {
            api_base: "http://api.example.com/".to_string(),
            ..Config::default()
        };
        config.normalize();
        assert_eq!(config.api_base, "http://api.example.com");

        let config = Config::from_json(r#"{"api_base": "http://api.example.com//"}"#).unwrap();
        assert_eq!(config.api_base, "http://api.example.com");
    }

    #[test]
    fn test_endpoint_join() {
        let config = Config::from_json(r#"{"api_base": "http://api.example.com/"}"#).unwrap();
        assert_eq!(
            config.endpoint("/api/my-ip"),
            "http://api.example.com/api/my-ip"
        );
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::from_json(r#"{"timeout_secs": 30}"#).unwrap();
        assert_eq!(config.api_base, "http://localhost:8000");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(Config::from_json("not json").is_err());
    }

    #[test]
    fn test_load_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_base": "http://10.0.0.1:9000/"}"#).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let config = Config::from_json(&content).unwrap();
        assert_eq!(config.api_base, "http://10.0.0.1:9000");
    }
}
