//! Event publication errors.

use thiserror::Error;

/// Errors returned when an event cannot be handed to the transport.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The transport has shut down
    #[error("event transport closed")]
    Closed,

    /// The transport refused the event
    #[error("event rejected: {0}")]
    Rejected(String),
}
