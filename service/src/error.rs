//! Error types for service entry points.

use pagewatch_crawl::CrawlError;
use pagewatch_db::DatabaseError;
use pagewatch_scanner::ScanError;
use serde::Serialize;

/// Serializable error returned by the non-scan entry points.
#[derive(Debug, Serialize)]
pub struct CommandError {
    /// Error code for client handling (e.g., "RATE_LIMITED")
    pub code: String,
    /// User-friendly error message
    pub message: String,
    /// Optional debugging context
    pub details: Option<serde_json::Value>,
}

impl CommandError {
    /// Create a new command error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Create a command error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

impl From<ScanError> for CommandError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::RateLimited { retry_after } => Self::with_details(
                "RATE_LIMITED",
                "Too many requests, please try again later",
                serde_json::json!({ "retryAfterSecs": retry_after.as_secs().max(1) }),
            ),
            ScanError::InvalidTarget(reason) => Self::new("INVALID_TARGET", reason),
            ScanError::MissingIdentity => {
                Self::new("MISSING_IDENTITY", "This call requires an account")
            }
            other => Self::new("SCAN_ERROR", other.to_string()),
        }
    }
}

impl From<DatabaseError> for CommandError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound => Self::new("NOT_FOUND", "Record not found"),
            DatabaseError::NotFoundWithMessage(msg) => Self::new("NOT_FOUND", msg),
            DatabaseError::InvalidInput(msg) => Self::new("INVALID_INPUT", msg),
            DatabaseError::MissingOwner(kind) => Self::new(
                "MISSING_OWNER",
                format!("Cannot store {kind} without an account"),
            ),
            other => Self::new("DATABASE_ERROR", format!("Database error: {other}")),
        }
    }
}

impl From<CrawlError> for CommandError {
    fn from(err: CrawlError) -> Self {
        match err {
            CrawlError::QueueFull => {
                Self::new("CRAWL_QUEUE_FULL", "Crawl queue is full, please try again later")
            }
            CrawlError::QueueClosed => Self::new("CRAWL_UNAVAILABLE", "Crawling is shutting down"),
            other => Self::new("CRAWL_ERROR", other.to_string()),
        }
    }
}
