use async_trait::async_trait;
use pagewatch_core::{ScanningConfig, UserId, Website};
use pagewatch_crawl::{
    ChannelSink, CrawlError, CrawlJob, CrawlService, CrawlStream, CrawlUpdate, PageScanner,
};
use pagewatch_scanner::{ScanData, ScanResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::Receiver;

/// Scanner that takes a fixed time per page and tracks peak concurrency.
struct SlowScanner {
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    scanned: AtomicUsize,
}

impl SlowScanner {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            scanned: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PageScanner for SlowScanner {
    async fn scan_page(&self, url: &str, user_id: Option<UserId>) -> ScanResult {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.scanned.fetch_add(1, Ordering::SeqCst);
        ScanResult::ok(ScanData {
            website: Website::new(url, "example.com", user_id),
            issues: Vec::new(),
            script: None,
        })
    }
}

fn config(concurrency: usize) -> ScanningConfig {
    ScanningConfig {
        crawl_concurrency: concurrency,
        crawl_queue_capacity: 8,
        ..ScanningConfig::default()
    }
}

fn job(pages: usize, full: bool) -> CrawlJob {
    CrawlJob {
        pages: (0..pages)
            .map(|n| format!("https://example.com/page-{n}"))
            .collect(),
        user_id: Some(UserId::new(42)),
        domain: "example.com".to_string(),
        full,
    }
}

fn open_stream() -> (Arc<CrawlStream>, Receiver<CrawlUpdate>) {
    let (sink, rx) = ChannelSink::new(16);
    (Arc::new(CrawlStream::new(sink)), rx)
}

async fn collect(mut rx: Receiver<CrawlUpdate>) -> Vec<CrawlUpdate> {
    let mut updates = Vec::new();
    while let Some(update) = rx.recv().await {
        updates.push(update);
    }
    updates
}

#[tokio::test]
async fn test_crawl_streams_every_page_then_closes() {
    let scanner = Arc::new(SlowScanner::new(Duration::from_millis(5)));
    let service = CrawlService::new(scanner.clone(), &config(3));
    let (stream, rx) = open_stream();

    service
        .submit_crawl(stream.clone(), job(4, false))
        .await
        .expect("submit crawl");

    let updates = tokio::time::timeout(Duration::from_secs(5), collect(rx))
        .await
        .expect("crawl finishes");
    assert_eq!(updates.len(), 4);
    assert!(updates.iter().all(|u| u.success && u.data.is_none()));
    assert!(stream.is_closed());

    // Entry released once the crawl is done
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(service.registry().is_empty());
}

#[tokio::test]
async fn test_full_crawl_includes_scan_data() {
    let scanner = Arc::new(SlowScanner::new(Duration::from_millis(1)));
    let service = CrawlService::new(scanner, &config(2));
    let (stream, rx) = open_stream();

    service.submit_crawl(stream, job(2, true)).await.expect("submit crawl");

    let updates = tokio::time::timeout(Duration::from_secs(5), collect(rx))
        .await
        .expect("crawl finishes");
    assert_eq!(updates.len(), 2);
    assert!(updates.iter().all(|u| u.data.is_some()));
}

#[tokio::test]
async fn test_pages_outside_domain_are_skipped() {
    let scanner = Arc::new(SlowScanner::new(Duration::from_millis(1)));
    let service = CrawlService::new(scanner.clone(), &config(2));
    let (stream, rx) = open_stream();

    let mut crawl = job(1, false);
    crawl.pages.push("https://other.org/login".to_string());
    crawl.pages.push("https://docs.example.com/start".to_string());
    service.submit_crawl(stream, crawl).await.expect("submit crawl");

    let updates = tokio::time::timeout(Duration::from_secs(5), collect(rx))
        .await
        .expect("crawl finishes");
    let urls: Vec<_> = updates.iter().map(|u| u.page_url.as_str()).collect();
    assert_eq!(urls.len(), 2);
    assert!(!urls.contains(&"https://other.org/login"));
    assert_eq!(scanner.scanned.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_concurrency_is_bounded_across_jobs() {
    let scanner = Arc::new(SlowScanner::new(Duration::from_millis(20)));
    let service = CrawlService::new(scanner.clone(), &config(2));

    let mut receivers = Vec::new();
    for domain in ["a.example.com", "b.example.com"] {
        let (stream, rx) = open_stream();
        let mut job = job(4, false);
        job.domain = domain.to_string();
        service.submit_crawl(stream, job).await.expect("submit crawl");
        receivers.push(rx);
    }

    for rx in receivers {
        let updates = tokio::time::timeout(Duration::from_secs(5), collect(rx))
            .await
            .expect("crawl finishes");
        assert_eq!(updates.len(), 4);
    }
    assert_eq!(scanner.scanned.load(Ordering::SeqCst), 8);
    assert!(scanner.peak.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn test_new_crawl_supersedes_active_one() {
    let scanner = Arc::new(SlowScanner::new(Duration::from_millis(30)));
    let service = CrawlService::new(scanner, &config(1));

    let (first, mut first_rx) = open_stream();
    service
        .submit_crawl(first.clone(), job(5, false))
        .await
        .expect("submit first crawl");

    // Wait for the first page of the first crawl
    let first_update = tokio::time::timeout(Duration::from_secs(5), first_rx.recv())
        .await
        .expect("first update arrives");
    assert!(first_update.is_some());

    let (second, second_rx) = open_stream();
    service
        .submit_crawl(second, job(5, false))
        .await
        .expect("submit second crawl");

    assert!(first.is_cancelled());
    assert!(first.is_closed());
    let rest = tokio::time::timeout(Duration::from_secs(5), collect(first_rx))
        .await
        .expect("first stream ends");
    assert!(rest.len() < 4, "superseded crawl kept streaming: {}", rest.len());

    let updates = tokio::time::timeout(Duration::from_secs(5), collect(second_rx))
        .await
        .expect("second crawl finishes");
    assert_eq!(updates.len(), 5);
}

#[tokio::test]
async fn test_rejected_crawl_closes_stream() {
    let scanner = Arc::new(SlowScanner::new(Duration::from_millis(1)));
    let service = CrawlService::new(scanner, &config(1));
    service.shutdown();
    // Let the dispatcher observe the shutdown and drop its receiver
    tokio::time::sleep(Duration::from_millis(20)).await;

    let (stream, _rx) = open_stream();
    let err = service
        .submit_crawl(stream.clone(), job(1, false))
        .await
        .expect_err("queue is closed");
    assert!(matches!(err, CrawlError::QueueClosed));
    assert!(stream.is_closed());
    assert!(service.registry().is_empty());
}
