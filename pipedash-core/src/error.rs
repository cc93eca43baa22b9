//! Error types for pipedash-core

use thiserror::Error;

/// Main error type for the pipedash-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure talking to the backend (connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("API error ({status}): {detail}")]
    Status { status: u16, detail: String },

    /// Response body did not have the expected shape
    #[error("unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True when the failure happened before any response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Http(_))
    }
}

/// Result type alias for pipedash-core
pub type Result<T> = std::result::Result<T, Error>;
