//! Crawl intake queue and dispatcher.
//!
//! Jobs go through a bounded mpsc channel to a dispatcher task that starts
//! one worker per job. Every page audit takes a permit from a semaphore shared
//! by all workers, so the remote engine never sees more than
//! `crawl_concurrency` audits from this process at once.

use crate::error::{CrawlError, Result};
use crate::job::{CrawlJob, CrawlUpdate, TrackingKey};
use crate::registry::{Ticket, TrackingRegistry};
use crate::stream::CrawlStream;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use pagewatch_core::{ScanningConfig, UserId};
use pagewatch_scanner::{ScanHandler, ScanResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

/// Scans one page of a crawl.
#[async_trait]
pub trait PageScanner: Send + Sync {
    /// Scan `url` on behalf of `user_id`.
    async fn scan_page(&self, url: &str, user_id: Option<UserId>) -> ScanResult;
}

#[async_trait]
impl PageScanner for ScanHandler {
    async fn scan_page(&self, url: &str, user_id: Option<UserId>) -> ScanResult {
        self.scan_simple(url, user_id, false).await
    }
}

struct QueuedCrawl {
    key: TrackingKey,
    ticket: Ticket,
    stream: Arc<CrawlStream>,
    job: CrawlJob,
}

/// Bounded crawl intake drained by a background dispatcher.
pub struct CrawlQueue {
    sender: mpsc::Sender<QueuedCrawl>,
    shutdown: CancellationToken,
}

impl CrawlQueue {
    /// Start the dispatcher. Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(
        scanner: Arc<dyn PageScanner>,
        registry: Arc<TrackingRegistry>,
        config: &ScanningConfig,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(config.crawl_queue_capacity.max(1));
        let shutdown = CancellationToken::new();
        let permits = Arc::new(Semaphore::new(config.crawl_concurrency.max(1)));

        tokio::spawn(dispatch(
            receiver,
            scanner,
            registry,
            permits,
            shutdown.clone(),
        ));

        Self { sender, shutdown }
    }

    fn enqueue(&self, item: QueuedCrawl) -> Result<()> {
        self.sender.try_send(item).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => CrawlError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => CrawlError::QueueClosed,
        })
    }

    /// Stop the dispatcher. Jobs already running finish their current page.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

async fn dispatch(
    mut receiver: mpsc::Receiver<QueuedCrawl>,
    scanner: Arc<dyn PageScanner>,
    registry: Arc<TrackingRegistry>,
    permits: Arc<Semaphore>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                tracing::info!("crawl dispatcher shutting down");
                break;
            }
            item = receiver.recv() => {
                let Some(item) = item else { break };
                tokio::spawn(run_crawl(
                    item,
                    scanner.clone(),
                    registry.clone(),
                    permits.clone(),
                    shutdown.child_token(),
                ));
            }
        }
    }
}

async fn run_crawl(
    item: QueuedCrawl,
    scanner: Arc<dyn PageScanner>,
    registry: Arc<TrackingRegistry>,
    permits: Arc<Semaphore>,
    shutdown: CancellationToken,
) {
    let QueuedCrawl {
        key,
        ticket,
        stream,
        job,
    } = item;
    let token = stream.token();
    let written = AtomicUsize::new(0);

    tracing::info!(%key, pages = job.pages.len(), full = job.full, "crawl started");

    stream::iter(job.pages.iter())
        .for_each_concurrent(None, |url| {
            let scanner = &scanner;
            let permits = &permits;
            let token = &token;
            let shutdown = &shutdown;
            let stream = &stream;
            let written = &written;
            let job = &job;
            async move {
                if !job.covers(url) {
                    tracing::debug!(
                        page_url = %url,
                        domain = %job.domain,
                        "skipping page outside crawl domain"
                    );
                    return;
                }
                let permit = tokio::select! {
                    () = token.cancelled() => return,
                    () = shutdown.cancelled() => return,
                    permit = permits.clone().acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return,
                    },
                };
                if token.is_cancelled() {
                    return;
                }

                let result = scanner.scan_page(url, job.user_id).await;
                drop(permit);

                if token.is_cancelled() {
                    tracing::debug!(page_url = %url, "dropping result of superseded crawl");
                    return;
                }
                let update = CrawlUpdate::from_result(url, &job.domain, result, job.full);
                match stream.write(update).await {
                    Ok(()) => {
                        written.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => tracing::debug!(page_url = %url, "crawl write skipped: {e}"),
                }
            }
        })
        .await;

    let cancelled = stream.is_cancelled();
    stream.close().await;
    registry.release(&key, ticket);

    tracing::info!(
        %key,
        written = written.load(Ordering::Relaxed),
        cancelled,
        "crawl finished"
    );
}

/// Entry point for site-wide crawls.
pub struct CrawlService {
    registry: Arc<TrackingRegistry>,
    queue: CrawlQueue,
}

impl CrawlService {
    /// Start a crawl service. Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(scanner: Arc<dyn PageScanner>, config: &ScanningConfig) -> Self {
        let registry = Arc::new(TrackingRegistry::new());
        let queue = CrawlQueue::start(scanner, registry.clone(), config);
        Self { registry, queue }
    }

    /// Track `stream` for the job's `(user, domain)` and queue the job.
    ///
    /// Any crawl already streaming for the same key is stopped first. When
    /// the queue refuses the job, the stream is closed and untracked.
    pub async fn submit_crawl(&self, stream: Arc<CrawlStream>, job: CrawlJob) -> Result<Ticket> {
        let key = job.tracking_key();
        let ticket = self.registry.register(key.clone(), stream.clone()).await;

        let item = QueuedCrawl {
            key: key.clone(),
            ticket,
            stream: stream.clone(),
            job,
        };
        if let Err(e) = self.queue.enqueue(item) {
            tracing::warn!(%key, "crawl rejected: {e}");
            stream.close().await;
            self.registry.release(&key, ticket);
            return Err(e);
        }

        Ok(ticket)
    }

    /// Tracking registry shared with the workers.
    #[must_use]
    pub fn registry(&self) -> &Arc<TrackingRegistry> {
        &self.registry
    }

    /// Stop accepting and dispatching crawls.
    pub fn shutdown(&self) {
        self.queue.shutdown();
    }
}
