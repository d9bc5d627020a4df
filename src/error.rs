//! Error types module.
//!
//! This module defines the error types used throughout the ipscout
//! application. It uses `thiserror` for structured error handling and
//! provides a custom `Result` type alias for convenience.

use thiserror::Error;

/// A specialized `Result` type for ipscout operations.
///
/// This type is used throughout the crate to handle errors consistently.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the ipscout application.
///
/// Each variant represents a different category of error that can occur
/// during a lookup or speed test operation.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (file operations, stdin, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error (configuration files, JSON output)
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error (connection failures, malformed responses)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// DNS resolver error (local lookup fallback)
    #[error("DNS resolver error: {0}")]
    Resolver(#[from] trust_dns_resolver::error::ResolveError),

    /// Non-2xx reply from the backend API.
    ///
    /// `message` carries the backend's `detail.message` field when the
    /// body had one, otherwise a generic `HTTP <status>` fallback.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Input rejected client-side before any network call
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Configuration error (invalid config, missing files)
    #[error("Config error: {0}")]
    Config(String),

    /// TUI (terminal UI) related error
    #[error("TUI error: {0}")]
    Tui(String),

    /// Network-level failure not tied to a single HTTP exchange
    #[error("Network error: {0}")]
    Network(String),
}

impl Error {
    /// Create an API error from a status code and message.
    #[must_use]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a new validation error with a message.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new configuration error with a message.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new TUI error with a message.
    #[must_use]
    pub fn tui(msg: impl Into<String>) -> Self {
        Self::Tui(msg.into())
    }

    /// Create a new network error with a message.
    #[must_use]
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_displays_bare_message() {
        let err = Error::api(404, "ASN not found");
        assert_eq!(err.to_string(), "ASN not found");
    }

    #[test]
    fn test_validation_error_display() {
        let err = Error::validation("999.1.1.1 is not a valid IPv4 address");
        assert_eq!(
            err.to_string(),
            "Invalid input: 999.1.1.1 is not a valid IPv4 address"
        );
    }
}
