//! Error types for the audit engine client.

use thiserror::Error;

/// Errors that can occur while calling the audit engine.
#[derive(Error, Debug)]
pub enum AuditError {
    /// The engine did not answer within the render ceiling
    #[error("audit timed out after {ms} ms")]
    Timeout {
        /// Ceiling that elapsed, in milliseconds
        ms: u64,
    },

    /// The engine could not be reached
    #[error("audit engine unreachable: {0}")]
    Unreachable(String),

    /// The engine refused the call because it is saturated
    #[error("audit engine refused the request (status {status})")]
    RateLimited {
        /// HTTP status returned
        status: u16,
    },

    /// The engine answered with an unexpected status
    #[error("audit engine error: status {status}, {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, if any
        message: String,
    },

    /// The engine answered with a body that is not a valid result
    #[error("failed to decode audit result: {0}")]
    Decode(#[from] serde_json::Error),

    /// The HTTP client could not be built
    #[error("failed to create audit client: {0}")]
    Client(String),
}

impl AuditError {
    /// True when callers should treat the failure like a render timeout.
    #[must_use]
    pub fn is_timeout_equivalent(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::RateLimited { .. })
    }
}

/// Result type alias for audit operations.
pub type Result<T> = std::result::Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuditError::Timeout { ms: 15_000 };
        assert_eq!(err.to_string(), "audit timed out after 15000 ms");

        let err = AuditError::Api {
            status: 500,
            message: "render crashed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "audit engine error: status 500, render crashed"
        );
    }

    #[test]
    fn test_timeout_equivalence() {
        assert!(AuditError::Timeout { ms: 1 }.is_timeout_equivalent());
        assert!(AuditError::RateLimited { status: 429 }.is_timeout_equivalent());
        assert!(!AuditError::Unreachable("refused".to_string()).is_timeout_equivalent());
    }
}
