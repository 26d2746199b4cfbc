//! Audit engine trait and wire types.

use crate::error::Result;
use async_trait::async_trait;
use pagewatch_core::{Issue, IssuesInfo, PageHeader, PageLoadTime, ScriptMeta, UserId};
use serde::{Deserialize, Serialize};

/// A remote engine that renders and audits a single page.
///
/// Implementations must be thread-safe (Send + Sync) so one engine can be
/// shared by every scan handler and crawl worker.
#[async_trait]
pub trait AuditEngine: Send + Sync {
    /// Render and audit one page.
    ///
    /// # Errors
    /// Returns error if the engine times out, is unreachable, refuses the
    /// call or answers with something that is not a result.
    async fn audit(&self, request: AuditRequest) -> Result<AuditResult>;
}

/// Options for one audit call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRequest {
    /// Page to audit
    pub url: String,
    /// Headers to send with the page request
    #[serde(default)]
    pub page_headers: Vec<PageHeader>,
    /// Owning account, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// Collect the performance insights report
    pub page_insights: bool,
    /// Do not store the generated script on the CDN
    pub no_store: bool,
    /// Generate the fix script
    pub scripts_enabled: bool,
}

impl AuditRequest {
    /// A request with every option off and `no_store` on.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            page_headers: Vec::new(),
            user_id: None,
            page_insights: false,
            no_store: true,
            scripts_enabled: false,
        }
    }
}

/// Raw page state as reported by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    /// Page URL
    pub url: String,
    /// Host of the page
    #[serde(default)]
    pub domain: String,
    /// Whether the CDN script is present
    #[serde(default)]
    pub cdn_connected: bool,
    /// Whether the page rendered
    #[serde(default)]
    pub online: bool,
    /// Summary counters
    #[serde(default)]
    pub issues_info: Option<IssuesInfo>,
    /// Raw insights report
    #[serde(default)]
    pub insight: Option<serde_json::Value>,
    /// Rendered markup
    #[serde(default)]
    pub html: Option<String>,
    /// When the page was audited
    #[serde(default)]
    pub last_scan_date: Option<String>,
    /// Load timing
    #[serde(default)]
    pub page_load_time: Option<PageLoadTime>,
}

/// Generated fix script as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptReport {
    /// Script source
    #[serde(default)]
    pub script: String,
    /// CDN location
    #[serde(default)]
    pub cdn_url: Option<String>,
    /// Minified CDN location
    #[serde(default)]
    pub cdn_url_minified: Option<String>,
    /// Script options
    #[serde(default)]
    pub script_meta: Option<ScriptMeta>,
}

/// Issue list as reported by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueReport {
    /// Findings in engine order
    #[serde(default)]
    pub issues: Vec<Issue>,
}

/// Result of one audit call.
///
/// `page == None` means the target did not render within the ceiling, which
/// is not the same as a page without issues.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    /// Page state
    #[serde(default, alias = "webPage")]
    pub page: Option<PageRecord>,
    /// Fix script
    #[serde(default)]
    pub script: Option<ScriptReport>,
    /// Findings
    #[serde(default)]
    pub issues: Option<IssueReport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_names() {
        let request = AuditRequest {
            user_id: Some(UserId::new(9)),
            page_insights: true,
            ..AuditRequest::new("https://example.com")
        };
        let json = serde_json::to_value(&request).expect("serialize request");
        assert_eq!(json["url"], "https://example.com");
        assert_eq!(json["userId"], 9);
        assert_eq!(json["pageInsights"], true);
        assert_eq!(json["noStore"], true);
        assert_eq!(json["scriptsEnabled"], false);
        assert!(json["pageHeaders"].as_array().is_some());
    }

    #[test]
    fn test_result_accepts_web_page_alias() {
        let json = r#"{
            "webPage": {
                "url": "https://example.com",
                "domain": "example.com",
                "online": true,
                "issuesInfo": {"errorCount": 1, "warningCount": 0, "noticeCount": 3},
                "insight": {"lighthouseVersion": "9.6"}
            },
            "issues": {"issues": [{"type": "error", "code": "H37", "selector": "img"}]}
        }"#;

        let result: AuditResult = serde_json::from_str(json).expect("deserialize result");
        let page = result.page.expect("page present");
        assert!(page.online);
        assert_eq!(page.issues_info.map(|i| i.notice_count), Some(3));
        assert!(page.insight.is_some());
        assert_eq!(result.issues.map(|i| i.issues.len()), Some(1));
        assert!(result.script.is_none());
    }

    #[test]
    fn test_null_page_is_timeout_shape() {
        let result: AuditResult =
            serde_json::from_str(r#"{"webPage": null, "script": null, "issues": null}"#)
                .expect("deserialize empty result");
        assert!(result.page.is_none());
    }
}
