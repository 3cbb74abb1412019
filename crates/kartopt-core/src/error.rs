//! Error types for the kart optimizer core.
//!
//! Every failure the fetch, cache and persistence layers can hit is expressed
//! here. None of them are fatal to the process: callers either report them
//! through the [`ErrorLog`](crate::report::ErrorLog) or surface them for
//! operations the user started explicitly (options save, save-data load).

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the kart optimizer.
#[derive(Debug, Error)]
pub enum KartError {
    // Network errors
    #[error("Network error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Unexpected HTTP status {status} for {url}")]
    UnexpectedStatus {
        status: u16,
        url: String,
        /// Full response description for diagnostics.
        detail: String,
    },

    // Decoding errors
    #[error("Failed to decode {name}: {message}")]
    Decode { name: String, message: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Validation errors
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Save file not found: {name}")]
    SaveNotFound { name: String },

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

/// Result type alias for kart optimizer operations.
pub type Result<T> = std::result::Result<T, KartError>;

impl From<std::io::Error> for KartError {
    fn from(err: std::io::Error) -> Self {
        KartError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for KartError {
    fn from(err: serde_json::Error) -> Self {
        KartError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for KartError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        if err.is_timeout() {
            KartError::Timeout { url }
        } else {
            KartError::Transport {
                url,
                message: err.to_string(),
            }
        }
    }
}

impl From<tokio::task::JoinError> for KartError {
    fn from(err: tokio::task::JoinError) -> Self {
        KartError::TaskFailed(err.to_string())
    }
}

impl KartError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        KartError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a decode error for a named resource.
    pub fn decode(name: impl Into<String>, err: impl std::fmt::Display) -> Self {
        KartError::Decode {
            name: name.into(),
            message: err.to_string(),
        }
    }

    /// Whether this error came from talking to the remote origin.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            KartError::Transport { .. }
                | KartError::Timeout { .. }
                | KartError::UnexpectedStatus { .. }
        )
    }
}
