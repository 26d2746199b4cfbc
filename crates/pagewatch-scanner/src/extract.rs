//! Normalization of a raw audit result.

use pagewatch_audit::{AuditResult, PageRecord, ScriptReport};
use pagewatch_core::{InsightBlob, Issue, IssuesInfo, PageSnapshot};

/// Audit result with summary counters lifted to the top level.
///
/// Counters are `None` when the engine reported no summary, which is not the
/// same as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedAudit {
    pub error_count: Option<u32>,
    pub warning_count: Option<u32>,
    pub notice_count: Option<u32>,
    pub ada_score: Option<f64>,
    pub page_has_cdn: Option<bool>,
    pub issues_info: Option<IssuesInfo>,
    pub script: Option<ScriptReport>,
    pub issues: Option<Vec<Issue>>,
    pub page: Option<PageSnapshot>,
}

impl ExtractedAudit {
    /// True when the page rendered.
    #[must_use]
    pub fn rendered(&self) -> bool {
        self.page.is_some()
    }

    /// Issues found, empty when none were reported.
    #[must_use]
    pub fn issue_list(&self) -> &[Issue] {
        self.issues.as_deref().unwrap_or_default()
    }
}

/// Normalize an engine result.
///
/// The insights report is re-encoded to an opaque string. A rendered page is
/// always marked online.
#[must_use]
pub fn extract(result: AuditResult) -> ExtractedAudit {
    let issues = result.issues.map(|report| report.issues);
    let script = result.script;

    let Some(record) = result.page else {
        return ExtractedAudit {
            script,
            issues,
            ..ExtractedAudit::default()
        };
    };

    if record.issues_info.is_none() {
        tracing::warn!(url = %record.url, "audit result has no issue summary");
    }

    let page = snapshot_from(record);
    let info = page.issues_info.clone();

    ExtractedAudit {
        error_count: info.as_ref().map(|i| i.error_count),
        warning_count: info.as_ref().map(|i| i.warning_count),
        notice_count: info.as_ref().map(|i| i.notice_count),
        ada_score: info.as_ref().and_then(|i| i.ada_score),
        page_has_cdn: Some(page.cdn_connected),
        issues_info: info,
        script,
        issues,
        page: Some(page),
    }
}

fn snapshot_from(record: PageRecord) -> PageSnapshot {
    PageSnapshot {
        url: record.url,
        domain: record.domain,
        cdn_connected: record.cdn_connected,
        online: true,
        issues_info: record.issues_info,
        insight: record.insight.map(|value| InsightBlob {
            json: value.to_string(),
        }),
        html: record.html,
        last_scan_date: record.last_scan_date,
        page_load_time: record.page_load_time,
    }
}
