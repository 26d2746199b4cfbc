//! Crawl job and per-page update shapes.

use pagewatch_core::{IssuesInfo, ScanTarget, UserId};
use pagewatch_scanner::{ScanData, ScanResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A site-wide crawl request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlJob {
    /// Pages to scan
    pub pages: Vec<String>,
    /// Owning account
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Domain the pages belong to
    pub domain: String,
    /// Stream full scan data per page instead of a summary
    #[serde(default)]
    pub full: bool,
}

impl CrawlJob {
    /// Registry key for this job's stream.
    #[must_use]
    pub fn tracking_key(&self) -> TrackingKey {
        TrackingKey {
            user_id: self.user_id,
            domain: self.domain.clone(),
        }
    }

    /// True when `page_url` is on the crawled domain or one of its subdomains.
    #[must_use]
    pub fn covers(&self, page_url: &str) -> bool {
        let Ok(target) = ScanTarget::parse(page_url) else {
            return false;
        };
        let host = target.domain();
        host == self.domain
            || host
                .strip_suffix(self.domain.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    }
}

/// At most one active crawl stream exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackingKey {
    /// Owning account
    pub user_id: Option<UserId>,
    /// Crawled domain
    pub domain: String,
}

impl fmt::Display for TrackingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.user_id {
            Some(user_id) => write!(f, "{user_id}:{}", self.domain),
            None => write!(f, "anonymous:{}", self.domain),
        }
    }
}

/// Result of one crawled page as written to the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlUpdate {
    /// Scanned page
    pub page_url: String,
    /// Domain of the crawl
    pub domain: String,
    /// Result code of the page scan
    pub code: u16,
    /// Whether the page scan succeeded
    pub success: bool,
    /// Result message
    pub message: String,
    /// Summary counters of the page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues_info: Option<IssuesInfo>,
    /// Full scan data, only for `full` crawls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ScanData>,
}

impl CrawlUpdate {
    /// Build the stream update for one page.
    #[must_use]
    pub fn from_result(page_url: &str, domain: &str, result: ScanResult, full: bool) -> Self {
        let issues_info = result
            .data
            .as_ref()
            .and_then(|data| data.website.issues_info.clone());

        Self {
            page_url: page_url.to_string(),
            domain: domain.to_string(),
            code: result.code,
            success: result.success,
            message: result.message,
            issues_info,
            data: if full { result.data } else { None },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagewatch_core::Website;

    fn result_with_info() -> ScanResult {
        let mut website = Website::new("https://example.com", "example.com", None);
        website.issues_info = Some(IssuesInfo {
            error_count: 4,
            ..IssuesInfo::default()
        });
        ScanResult::ok(ScanData {
            website,
            issues: Vec::new(),
            script: None,
        })
    }

    #[test]
    fn test_slim_update_drops_data() {
        let update =
            CrawlUpdate::from_result("https://example.com", "example.com", result_with_info(), false);
        assert_eq!(update.code, 200);
        assert!(update.data.is_none());
        assert_eq!(update.issues_info.map(|i| i.error_count), Some(4));
    }

    #[test]
    fn test_full_update_keeps_data() {
        let update =
            CrawlUpdate::from_result("https://example.com", "example.com", result_with_info(), true);
        assert!(update.data.is_some());
    }

    #[test]
    fn test_job_wire_shape() {
        let job: CrawlJob = serde_json::from_str(
            r#"{"pages": ["https://example.com", "https://example.com/a"], "userId": 42, "domain": "example.com", "full": true}"#,
        )
        .expect("deserialize job");
        assert_eq!(job.pages.len(), 2);
        assert_eq!(job.tracking_key().to_string(), "42:example.com");
    }

    #[test]
    fn test_covers_domain_and_subdomains() {
        let job = CrawlJob {
            pages: Vec::new(),
            user_id: None,
            domain: "example.com".to_string(),
            full: false,
        };
        assert!(job.covers("https://example.com/about"));
        assert!(job.covers("blog.example.com/post"));
        assert!(!job.covers("https://notexample.com"));
        assert!(!job.covers("https://example.org"));
        assert!(!job.covers("ftp://example.com"));
    }
}
