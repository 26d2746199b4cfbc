//! Streaming handle for crawl results.

use crate::error::{CrawlError, Result};
use crate::job::CrawlUpdate;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Transport that carries crawl updates back to the caller.
#[async_trait]
pub trait CrawlSink: Send + Sync {
    /// Deliver one update.
    async fn send(&self, update: CrawlUpdate) -> Result<()>;

    /// End the stream. Called at most once per [`CrawlStream`].
    async fn close(&self);
}

/// [`CrawlSink`] backed by a bounded mpsc channel.
///
/// Closing drops the sender, so the receiver sees the end of the stream.
pub struct ChannelSink {
    sender: Mutex<Option<mpsc::Sender<CrawlUpdate>>>,
}

impl ChannelSink {
    /// Create a sink and the receiver its updates arrive on.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<CrawlUpdate>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    fn sender(&self) -> Option<mpsc::Sender<CrawlUpdate>> {
        self.sender.lock().ok().and_then(|guard| guard.as_ref().cloned())
    }
}

#[async_trait]
impl CrawlSink for ChannelSink {
    async fn send(&self, update: CrawlUpdate) -> Result<()> {
        let sender = self.sender().ok_or(CrawlError::StreamClosed)?;
        sender
            .send(update)
            .await
            .map_err(|_| CrawlError::Sink("receiver dropped".to_string()))
    }

    async fn close(&self) {
        if let Ok(mut guard) = self.sender.lock() {
            guard.take();
        }
    }
}

/// One caller's crawl stream.
///
/// Carries the cancellation token checked by the crawl workers. Writes are
/// refused once the stream is cancelled or closed.
pub struct CrawlStream {
    sink: Box<dyn CrawlSink>,
    token: CancellationToken,
    closed: AtomicBool,
}

impl CrawlStream {
    /// Wrap a sink in a fresh, uncancelled stream.
    pub fn new(sink: impl CrawlSink + 'static) -> Self {
        Self {
            sink: Box::new(sink),
            token: CancellationToken::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Token cancelled when the stream is superseded or closed.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Stop further work for this stream.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// True once the stream was cancelled or closed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// True once [`close`](Self::close) ran.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Write one update.
    pub async fn write(&self, update: CrawlUpdate) -> Result<()> {
        if self.is_cancelled() || self.is_closed() {
            return Err(CrawlError::StreamClosed);
        }
        self.sink.send(update).await
    }

    /// Cancel and end the stream. Safe to call more than once.
    pub async fn close(&self) {
        self.token.cancel();
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.sink.close().await;
    }
}
