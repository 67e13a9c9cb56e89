//! Error type definitions for LedgerGlow
//!
//! Internal layers return these errors with `?`. The aggregator is the only
//! place where they are turned into fallback payloads, so none of them ever
//! reaches an HTTP client as a failure status.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Upstream API or image host failures
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Logo store persistence failures
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Errors talking to the token-data API or the logo host
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Non-2xx response
    #[error("HTTP error: {status} - {url}")]
    Status { status: u16, url: String },

    /// Request did not complete within its deadline
    #[error("Request timed out: {url}")]
    Timeout { url: String },

    /// Connection, TLS or body read failures
    #[error("Request failed: {url} - {message}")]
    Request { url: String, message: String },

    /// Response arrived but did not have the expected shape
    #[error("Malformed response from {endpoint}: {message}")]
    Malformed { endpoint: String, message: String },
}

/// Logo store persistence errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Atomic rename of the temporary document failed
    #[error("Failed to persist {path}: {message}")]
    Persist { path: PathBuf, message: String },
}

impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl UpstreamError {
    /// Map a reqwest error for `url` onto the upstream taxonomy
    pub fn from_reqwest<U: Into<String>>(url: U, err: reqwest::Error) -> Self {
        let url = url.into();
        if err.is_timeout() {
            Self::Timeout { url }
        } else if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
                url,
            }
        } else {
            Self::Request {
                url,
                message: err.to_string(),
            }
        }
    }

    /// Create a malformed response error
    pub fn malformed<E: Into<String>, M: Into<String>>(endpoint: E, message: M) -> Self {
        Self::Malformed {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Short label used in log lines (status code when there is one)
    pub fn summary(&self) -> String {
        match self {
            Self::Status { status, .. } => status.to_string(),
            Self::Timeout { .. } => "timeout".to_string(),
            Self::Request { message, .. } => message.clone(),
            Self::Malformed { message, .. } => message.clone(),
        }
    }
}
