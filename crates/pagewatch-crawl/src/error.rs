//! Crawl errors.

use thiserror::Error;

/// Errors from crawl intake and streaming.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The intake queue is at capacity
    #[error("crawl queue is full")]
    QueueFull,

    /// The dispatcher has shut down
    #[error("crawl queue is closed")]
    QueueClosed,

    /// The stream was cancelled or closed
    #[error("crawl stream is closed")]
    StreamClosed,

    /// The sink refused the write
    #[error("sink error: {0}")]
    Sink(String),
}

/// Result type alias for crawl operations.
pub type Result<T> = std::result::Result<T, CrawlError>;
