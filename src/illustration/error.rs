//! Illustration fetch error types

use thiserror::Error;

/// Fetch error with classification
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct IllustrationError {
    pub kind: IllustrationErrorKind,
    pub message: String,
}

impl IllustrationError {
    pub fn new(kind: IllustrationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(IllustrationErrorKind::RateLimit, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(IllustrationErrorKind::ServerError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(IllustrationErrorKind::InvalidRequest, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(IllustrationErrorKind::Network, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(IllustrationErrorKind::Malformed, message)
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            429 => Self::rate_limit(format!("Rate limited: {body}")),
            500..=599 => Self::server_error(format!("Server error {status}: {body}")),
            _ => Self::invalid_request(format!("HTTP {status}: {body}")),
        }
    }
}

/// Error classification for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IllustrationErrorKind {
    /// Rate limited (429) - retryable with backoff
    RateLimit,
    /// Server error (5xx) - retryable
    ServerError,
    /// Client error (4xx other than 429) - not retryable
    InvalidRequest,
    /// Connection or transport fault - not retryable
    Network,
    /// Response body did not contain a usable image
    Malformed,
}

impl IllustrationErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimit | Self::ServerError)
    }
}
