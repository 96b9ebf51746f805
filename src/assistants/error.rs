//! Error type for remote calls.

use thiserror::Error;

/// Failure of a single call to the remote endpoint.
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request failed before a response was read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Local file could not be read for upload.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Whether retrying the same call later may succeed.
    ///
    /// Connection failures, timeouts, rate limiting and 5xx responses are
    /// transient; everything else is a permanent answer from the remote side.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::InvalidUrl(_) | Self::Json(_) | Self::Io(_) => false,
        }
    }
}

/// Result type alias for remote calls.
pub type Result<T> = std::result::Result<T, ApiError>;
