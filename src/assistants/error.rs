//! Error types for the remote Assistants API.

use thiserror::Error;

/// Errors raised while talking to the remote Assistants API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request failed (connection, TLS, timeout, body decoding).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid base URL or path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// API returned a non-success response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },
}

impl ApiError {
    /// HTTP status reported by the remote API, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::InvalidUrl(_) => None,
        }
    }
}

/// Result type alias for remote API calls.
pub type Result<T> = std::result::Result<T, ApiError>;
