//! Error types for the DhakaFlix source
//!
//! Network and parse failures are normally absorbed inside the protocol
//! adapter and the crawl resolver; the variants that reach callers are the
//! aggregate "nothing found" state and configuration/input mistakes.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error type for all DhakaFlix operations
///
/// Implements Display for human-readable messages and Serialize
/// for Tauri command compatibility.
#[derive(Error, Debug)]
pub enum DhakaflixError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Response body could not be understood
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration rejected at construction time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Query rejected before any request was made
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Resource not found on server (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// The operation completed but produced nothing usable
    #[error("No results found: {0}")]
    NoResults(String),
}

impl DhakaflixError {
    /// Whether the failure is worth another attempt
    pub(crate) fn is_transient(&self) -> bool {
        match self {
            DhakaflixError::HttpError(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().map(|s| s.is_server_error()).unwrap_or(false)
            }
            _ => false,
        }
    }
}

impl Serialize for DhakaflixError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for DhakaFlix operations
pub type Result<T> = std::result::Result<T, DhakaflixError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_parse_error() {
        let error = DhakaflixError::ParseError("missing search array".to_string());
        assert_eq!(error.to_string(), "Failed to parse response: missing search array");
    }

    #[test]
    fn test_error_display_invalid_config() {
        let error = DhakaflixError::InvalidConfig("no servers configured".to_string());
        assert_eq!(error.to_string(), "Invalid configuration: no servers configured");
    }

    #[test]
    fn test_error_display_no_results() {
        let error = DhakaflixError::NoResults("http://172.16.50.9/x/".to_string());
        assert_eq!(error.to_string(), "No results found: http://172.16.50.9/x/");
    }

    #[test]
    fn test_non_network_errors_not_transient() {
        assert!(!DhakaflixError::NotFound("/a/".to_string()).is_transient());
        assert!(!DhakaflixError::ParseError("bad".to_string()).is_transient());
    }

    #[test]
    fn test_error_serialize() {
        let error = DhakaflixError::InvalidQuery("empty".to_string());
        let json = serde_json::to_string(&error).expect("Serialization should succeed");
        assert_eq!(json, "\"Invalid query: empty\"");
    }
}
