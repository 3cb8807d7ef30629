//! Error types for the weather grid cache.

use thiserror::Error;

/// Result type alias using GridError.
pub type GridResult<T> = Result<T, GridError>;

/// Primary error type for grid fetches.
///
/// No variant is ever written into the cache; every error is terminal for
/// the call that produced it and the next request retries upstream.
#[derive(Debug, Error)]
pub enum GridError {
    // === Caller Errors ===
    #[error("Request cancelled")]
    Cancelled,

    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Invalid step: {0} (must be finite and > 0)")]
    InvalidStep(f64),

    // === Upstream Errors ===
    #[error("{}", upstream_message(.status, .message))]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    // === Infrastructure Errors ===
    #[error("Configuration error: {0}")]
    Config(String),
}

fn upstream_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("Upstream error ({}): {}", code, message),
        None => format!("Upstream error: {}", message),
    }
}

impl GridError {
    /// Build an upstream error from an HTTP status and body text.
    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        GridError::Upstream {
            status,
            message: message.into(),
        }
    }

    /// Build a MalformedResponse error.
    pub fn malformed(message: impl Into<String>) -> Self {
        GridError::MalformedResponse(message.into())
    }

    /// Cancellation is a normal termination, not a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, GridError::Cancelled)
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            GridError::InvalidBounds(_) | GridError::InvalidStep(_) => 400,

            // Client closed request (nginx convention); nobody reads the body.
            GridError::Cancelled => 499,

            GridError::Upstream { .. } | GridError::MalformedResponse(_) => 502,

            GridError::Config(_) => 500,
        }
    }
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        GridError::MalformedResponse(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_display_with_status() {
        let err = GridError::upstream(Some(429), "rate limited");
        assert_eq!(err.to_string(), "Upstream error (429): rate limited");
        assert_eq!(err.http_status_code(), 502);
    }

    #[test]
    fn test_upstream_display_transport() {
        let err = GridError::upstream(None, "connection refused");
        assert_eq!(err.to_string(), "Upstream error: connection refused");
    }

    #[test]
    fn test_cancelled_is_not_a_failure() {
        assert!(GridError::Cancelled.is_cancelled());
        assert!(!GridError::malformed("x").is_cancelled());
    }
}
