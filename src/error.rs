//! Error types for the exporter
//!
//! All public APIs return `Result<T, Error>` where `Error` is defined here.
//! Per-branch crawl failures (bad page, API error, no data) are not errors
//! at all — they terminate the branch silently. Only configuration problems
//! are fatal to a run.

use thiserror::Error;

/// The main error type for the exporter
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors (fatal, fail fast before any crawl work)
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Max retries ({max_retries}) exceeded")]
    MaxRetriesExceeded { max_retries: u32 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Export Errors
    // ============================================================================
    #[error("Sink error: {message}")]
    Sink { message: String },

    #[error("Split error for {path}: {message}")]
    Split { path: String, message: String },

    // ============================================================================
    // Upload Errors
    // ============================================================================
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Upload failed for {key} after {attempts} attempts: {message}")]
    Upload {
        key: String,
        attempts: u32,
        message: String,
    },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a sink error
    pub fn sink(message: impl Into<String>) -> Self {
        Self::Sink {
            message: message.into(),
        }
    }

    /// Create a split error
    pub fn split(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Split {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an upload error
    pub fn upload(key: impl Into<String>, attempts: u32, message: impl Into<String>) -> Self {
        Self::Upload {
            key: key.into(),
            attempts,
            message: message.into(),
        }
    }

    /// Check if this error is worth retrying at the HTTP layer
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            Error::ObjectStore(e) => !matches!(e, object_store::Error::NotFound { .. }),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for the exporter
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("auth_token");
        assert_eq!(
            err.to_string(),
            "Missing required config field: auth_token"
        );

        let err = Error::http_status(404, "Not found");
        assert_eq!(err.to_string(), "HTTP 404: Not found");
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::Timeout { timeout_ms: 1000 }.is_retryable());
        assert!(Error::http_status(429, "").is_retryable());
        assert!(Error::http_status(500, "").is_retryable());
        assert!(Error::http_status(503, "").is_retryable());

        assert!(!Error::http_status(400, "").is_retryable());
        assert!(!Error::http_status(401, "").is_retryable());
        assert!(!Error::config("test").is_retryable());
        assert!(!Error::sink("full").is_retryable());
    }

    #[test]
    fn test_upload_error_display() {
        let err = Error::upload("run/Leads/Leads-0.json", 3, "connection reset");
        assert_eq!(
            err.to_string(),
            "Upload failed for run/Leads/Leads-0.json after 3 attempts: connection reset"
        );
    }
}
