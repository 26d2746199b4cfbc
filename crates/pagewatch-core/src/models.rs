//! Record shapes persisted and returned by the scan pipeline.
//!
//! Every record derived from one audit result shares the identity
//! `(page_url, user_id)`, except [`Website`] which is keyed by
//! `(domain, user_id)`. Records are built from named fields; merging a fresh
//! audit into a stored record always produces a new value.

use crate::types::{PageIdentity, Runner, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of an accessibility issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    /// A definite violation
    Error,
    /// A probable violation
    Warning,
    /// Something to check manually
    Notice,
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Notice => "notice",
        };
        f.write_str(name)
    }
}

/// A single accessibility finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Severity
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    /// Rule identifier
    #[serde(alias = "code")]
    pub rule: String,
    /// CSS selector of the offending element
    pub selector: String,
    /// Human readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Markup excerpt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Runner that reported the issue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner: Option<String>,
    /// How many times the same rule fired on the page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<u32>,
}

/// Issues found on one page, keyed by `(page_url, user_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSet {
    /// Page the issues belong to
    pub page_url: String,
    /// Host of the page
    pub domain: String,
    /// Owning account; `None` for anonymous scans
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// The findings, in engine order
    #[serde(default)]
    pub issues: Vec<Issue>,
}

impl IssueSet {
    /// True when at least one finding is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.issue_type == IssueType::Error)
    }
}

/// Summary counters for a page or website.
///
/// `limited_count` is set only on responses where the issue list was cut
/// down to the preview cap, and holds the post-truncation length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuesInfo {
    /// Number of errors
    pub error_count: u32,
    /// Number of warnings
    pub warning_count: u32,
    /// Number of notices
    pub notice_count: u32,
    /// Accessibility score, 0-100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ada_score: Option<f64>,
    /// Total issue count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_issues: Option<u32>,
    /// Issues fixed by the CDN script
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues_fixed_by_cdn: Option<u32>,
    /// Issues the CDN script could fix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub possible_issues_fixed_by_cdn: Option<u32>,
    /// Length of the truncated issue list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limited_count: Option<usize>,
}

impl IssuesInfo {
    /// Copy of these counters with `limited_count` recorded.
    #[must_use]
    pub fn with_limited_count(&self, count: usize) -> Self {
        Self {
            limited_count: Some(count),
            ..self.clone()
        }
    }
}

/// Performance insights report, stored as an opaque serialized string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightBlob {
    /// Serialized JSON report
    pub json: String,
}

/// Page load timing reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLoadTime {
    /// Load duration in milliseconds
    pub duration: u64,
    /// Human readable duration
    #[serde(default, alias = "durationFormated")]
    pub duration_formatted: Option<String>,
    /// Display color bucket
    #[serde(default)]
    pub color: Option<String>,
}

/// Normalized state of a crawled page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    /// Page URL
    pub url: String,
    /// Host of the page
    pub domain: String,
    /// Whether the CDN script is present on the page
    #[serde(default)]
    pub cdn_connected: bool,
    /// Whether the page rendered
    #[serde(default)]
    pub online: bool,
    /// Summary counters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues_info: Option<IssuesInfo>,
    /// Insights report blob
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insight: Option<InsightBlob>,
    /// Rendered markup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    /// When the engine audited the page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scan_date: Option<String>,
    /// Load timing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_load_time: Option<PageLoadTime>,
}

impl PageSnapshot {
    /// Copy of the snapshot with rendered markup removed.
    #[must_use]
    pub fn without_markup(&self) -> Self {
        Self {
            html: None,
            ..self.clone()
        }
    }
}

/// One row per crawled URL with the latest snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Owning account
    pub user_id: UserId,
    /// Latest snapshot
    #[serde(flatten)]
    pub snapshot: PageSnapshot,
    /// Last write time
    pub timestamp: DateTime<Utc>,
}

impl Page {
    /// Page row for `snapshot`, keyed by `identity` rather than the URL the
    /// engine reported.
    #[must_use]
    pub fn for_identity(
        identity: &PageIdentity,
        snapshot: &PageSnapshot,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: identity.user_id,
            snapshot: PageSnapshot {
                url: identity.page_url.clone(),
                domain: identity.domain.clone(),
                ..snapshot.clone()
            },
            timestamp,
        }
    }

    /// The page URL this row is keyed by.
    #[must_use]
    pub fn page_url(&self) -> &str {
        &self.snapshot.url
    }
}

/// Options for the stored CDN script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptMeta {
    /// Whether the injected skip-to-content link is enabled
    pub skip_content_enabled: bool,
}

impl Default for ScriptMeta {
    fn default() -> Self {
        Self {
            skip_content_enabled: true,
        }
    }
}

/// Generated fix script for a page, keyed by `(page_url, user_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptRecord {
    /// Page the script belongs to
    pub page_url: String,
    /// Host of the page
    pub domain: String,
    /// Owning account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// Script source
    #[serde(default)]
    pub script: String,
    /// CDN location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdn_url: Option<String>,
    /// Minified CDN location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdn_url_minified: Option<String>,
    /// Script options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_meta: Option<ScriptMeta>,
}

/// Per-page counters, keyed by `(page_url, user_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRecord {
    /// Page the counters belong to
    pub page_url: String,
    /// Host of the page
    pub domain: String,
    /// Owning account
    pub user_id: UserId,
    /// Error count; `None` when the engine reported no summary
    pub error_count: Option<u32>,
    /// Warning count
    pub warning_count: Option<u32>,
    /// Notice count
    pub notice_count: Option<u32>,
    /// Accessibility score
    pub ada_score: Option<f64>,
}

/// A request header sent with every audit of a website.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageHeader {
    /// Header name
    pub key: String,
    /// Header value
    pub value: String,
}

/// A monitored website, keyed by `(domain, user_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Website {
    /// Owning account; `None` for anonymous scan responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// Root URL
    pub url: String,
    /// Host
    pub domain: String,
    /// Headers sent with each audit
    #[serde(default)]
    pub page_headers: Vec<PageHeader>,
    /// Audit with a mobile viewport
    #[serde(default)]
    pub mobile: bool,
    /// Collect the insights report on every page
    #[serde(default)]
    pub page_insights: bool,
    /// Accessibility standard, e.g. `WCAG2AA`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<String>,
    /// Custom user agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ua: Option<String>,
    /// Follow subdomains when crawling
    #[serde(default)]
    pub subdomains: bool,
    /// Follow other top level domains when crawling
    #[serde(default)]
    pub tld: bool,
    /// Respect robots.txt when crawling
    #[serde(default = "default_robots")]
    pub robots: bool,
    /// Rules to run
    #[serde(default)]
    pub rules: Vec<String>,
    /// Rules to ignore
    #[serde(default)]
    pub ignore: Vec<String>,
    /// Runners to use
    #[serde(default)]
    pub runners: Vec<Runner>,
    /// Whether the last audit rendered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online: Option<bool>,
    /// Whether the CDN script is installed
    #[serde(default)]
    pub cdn_connected: bool,
    /// Summary counters of the root page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues_info: Option<IssuesInfo>,
    /// Insights report of the root page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insight: Option<InsightBlob>,
    /// Root page load timing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_load_time: Option<PageLoadTime>,
    /// When the engine last audited the root page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scan_date: Option<String>,
    /// Last write time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

fn default_robots() -> bool {
    true
}

impl Website {
    /// A website with default settings.
    #[must_use]
    pub fn new(url: impl Into<String>, domain: impl Into<String>, user_id: Option<UserId>) -> Self {
        Self {
            user_id,
            url: url.into(),
            domain: domain.into(),
            page_headers: Vec::new(),
            mobile: false,
            page_insights: false,
            standard: None,
            ua: None,
            subdomains: false,
            tld: false,
            robots: true,
            rules: Vec::new(),
            ignore: Vec::new(),
            runners: Vec::new(),
            online: None,
            cdn_connected: false,
            issues_info: None,
            insight: None,
            page_load_time: None,
            last_scan_date: None,
            timestamp: None,
        }
    }

    /// A new website value carrying the latest audit of its root page.
    ///
    /// Configuration fields are kept; audit-derived fields come from `snapshot`.
    #[must_use]
    pub fn with_snapshot(&self, snapshot: &PageSnapshot, timestamp: DateTime<Utc>) -> Self {
        Self {
            online: Some(snapshot.online),
            cdn_connected: snapshot.cdn_connected,
            issues_info: snapshot.issues_info.clone(),
            insight: snapshot.insight.clone(),
            page_load_time: snapshot.page_load_time.clone(),
            last_scan_date: snapshot.last_scan_date.clone(),
            timestamp: Some(timestamp),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_issue(issue_type: IssueType) -> Issue {
        Issue {
            issue_type,
            rule: "WCAG2AA.Principle1.Guideline1_1.1_1_1.H37".to_string(),
            selector: "img".to_string(),
            message: Some("Img element missing an alt attribute.".to_string()),
            context: None,
            runner: Some("htmlcs".to_string()),
            recurrence: None,
        }
    }

    fn sample_snapshot() -> PageSnapshot {
        PageSnapshot {
            url: "https://example.com".to_string(),
            domain: "example.com".to_string(),
            cdn_connected: true,
            online: true,
            issues_info: Some(IssuesInfo {
                error_count: 2,
                warning_count: 1,
                ..IssuesInfo::default()
            }),
            insight: Some(InsightBlob {
                json: "{}".to_string(),
            }),
            html: Some("<html></html>".to_string()),
            last_scan_date: None,
            page_load_time: None,
        }
    }

    #[test]
    fn test_issue_accepts_code_alias() {
        let json = r#"{"type":"warning","code":"color-contrast","selector":"p"}"#;
        let issue: Issue = serde_json::from_str(json).expect("deserialize issue");
        assert_eq!(issue.issue_type, IssueType::Warning);
        assert_eq!(issue.rule, "color-contrast");

        let out = serde_json::to_string(&issue).expect("serialize issue");
        assert!(out.contains("\"type\":\"warning\""));
        assert!(out.contains("\"rule\":\"color-contrast\""));
    }

    #[test]
    fn test_issue_set_has_errors() {
        let mut set = IssueSet {
            page_url: "https://example.com".to_string(),
            domain: "example.com".to_string(),
            user_id: None,
            issues: vec![sample_issue(IssueType::Notice)],
        };
        assert!(!set.has_errors());

        set.issues.push(sample_issue(IssueType::Error));
        assert!(set.has_errors());
    }

    #[test]
    fn test_limited_count_does_not_touch_original() {
        let info = IssuesInfo::default();
        let limited = info.with_limited_count(2);
        assert_eq!(limited.limited_count, Some(2));
        assert_eq!(info.limited_count, None);
    }

    #[test]
    fn test_without_markup() {
        let snapshot = sample_snapshot();
        let stripped = snapshot.without_markup();
        assert!(stripped.html.is_none());
        assert!(snapshot.html.is_some());
        assert_eq!(stripped.url, snapshot.url);
    }

    #[test]
    fn test_website_with_snapshot_keeps_settings() {
        let mut website = Website::new("https://example.com", "example.com", Some(UserId::new(3)));
        website.page_insights = true;
        website.runners = vec![Runner::Axe];

        let now = Utc::now();
        let merged = website.with_snapshot(&sample_snapshot(), now);

        assert!(merged.page_insights);
        assert_eq!(merged.runners, vec![Runner::Axe]);
        assert_eq!(merged.online, Some(true));
        assert!(merged.cdn_connected);
        assert_eq!(merged.issues_info.as_ref().map(|i| i.error_count), Some(2));
        assert_eq!(merged.timestamp, Some(now));
        assert!(website.timestamp.is_none());
    }

    #[test]
    fn test_script_meta_default() {
        assert!(ScriptMeta::default().skip_content_enabled);
    }

    #[test]
    fn test_website_robots_defaults_on() {
        let json = r#"{"url":"https://example.com","domain":"example.com"}"#;
        let website: Website = serde_json::from_str(json).expect("deserialize website");
        assert!(website.robots);
        assert!(website.runners.is_empty());
    }

    #[test]
    fn test_page_keyed_by_identity() {
        let identity = PageIdentity {
            domain: "example.com".to_string(),
            user_id: UserId::new(42),
            page_url: "https://example.com/about".to_string(),
            pathname: "/about".to_string(),
        };
        let snapshot = PageSnapshot {
            url: "https://example.com/about/".to_string(),
            ..sample_snapshot()
        };

        let page = Page::for_identity(&identity, &snapshot, Utc::now());
        assert_eq!(page.page_url(), "https://example.com/about");
        assert_eq!(page.user_id, UserId::new(42));
        assert_eq!(page.snapshot.issues_info, snapshot.issues_info);
    }
}
