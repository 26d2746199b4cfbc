use crate::persist::EntityKind;
use pagewatch_audit::AuditError;
use pagewatch_core::PagewatchError;
use pagewatch_db::DatabaseError;
use pagewatch_events::PublishError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("website did not render within the audit ceiling")]
    RenderTimeout,

    #[error("audit engine unreachable: {0}")]
    Unreachable(String),

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("authenticated scan requires a user id")]
    MissingIdentity,

    #[error("persistence partially failed for {failed:?}")]
    PersistencePartialFailure { failed: Vec<EntityKind> },

    #[error("failed to publish event: {0}")]
    PublishFailure(#[from] PublishError),

    #[error("audit error: {0}")]
    Audit(AuditError),

    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<AuditError> for ScanError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::Timeout { .. } | AuditError::RateLimited { .. } => Self::RenderTimeout,
            AuditError::Unreachable(reason) => Self::Unreachable(reason),
            other => Self::Audit(other),
        }
    }
}

impl From<PagewatchError> for ScanError {
    fn from(err: PagewatchError) -> Self {
        match err {
            PagewatchError::InvalidTarget(reason) => Self::InvalidTarget(reason),
            other => Self::InvalidTarget(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
