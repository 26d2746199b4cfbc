//! Scan request handling.
//!
//! This module provides the `ScanHandler`, which takes a request from a raw
//! URL to a [`ScanResult`]: target normalization, tier gating, the audit
//! call, extraction, persistence and issue limiting.

use crate::error::{Result, ScanError};
use crate::extract::{extract, ExtractedAudit};
use crate::limit::IssueLimiter;
use crate::notify::{IssueNotifier, LogNotifier};
use crate::persist::{PersistOptions, PersistenceCoordinator};
use crate::result::{ScanData, ScanResult};
use chrono::Utc;
use pagewatch_audit::{AuditEngine, AuditRequest};
use pagewatch_core::{
    Account, AppConfig, Environment, IssueSet, PageIdentity, ScanRequest, ScanTarget,
    ScriptRecord, UserId, Website,
};
use pagewatch_db::ScanStore;
use pagewatch_events::EventPublisher;
use std::sync::Arc;

const LOCALHOST_REJECTED: &str = "Cannot use localhost, please use a valid web url.";

/// Runs single-page scans for anonymous and authenticated callers.
pub struct ScanHandler {
    engine: Arc<dyn AuditEngine>,
    store: Arc<dyn ScanStore>,
    coordinator: PersistenceCoordinator,
    notifier: Arc<dyn IssueNotifier>,
    limiter: IssueLimiter,
    environment: Environment,
    super_mode: bool,
    disable_store_scripts: bool,
    timeout_ms: u64,
}

impl ScanHandler {
    /// Create a handler from configuration.
    ///
    /// Alerts go to a [`LogNotifier`] until [`with_notifier`](Self::with_notifier)
    /// replaces it.
    #[must_use]
    pub fn new(
        engine: Arc<dyn AuditEngine>,
        store: Arc<dyn ScanStore>,
        publisher: Arc<dyn EventPublisher>,
        config: &AppConfig,
    ) -> Self {
        Self {
            engine,
            coordinator: PersistenceCoordinator::new(store.clone(), publisher),
            store,
            notifier: Arc::new(LogNotifier),
            limiter: IssueLimiter::new(config.scanning.issue_preview_cap),
            environment: config.general.environment,
            super_mode: config.general.super_mode,
            disable_store_scripts: config.scanning.disable_store_scripts,
            timeout_ms: config.audit.timeout_ms,
        }
    }

    /// Replace the alert notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn IssueNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Scan without persisting anything or publishing events.
    ///
    /// The engine is told not to store scripts and not to collect insights.
    /// Issues are cut to the preview cap unless the request carries a user id
    /// or super mode is on.
    pub async fn scan_anonymous(&self, request: &ScanRequest) -> ScanResult {
        let outcome = self.try_scan_anonymous(request).await;
        self.respond(request.url(), outcome)
    }

    /// Scan for an account and persist every derived record.
    ///
    /// A page that does not render produces a timeout result with no writes
    /// and no events.
    pub async fn scan_authenticated(&self, request: &ScanRequest) -> ScanResult {
        let outcome = self.try_scan_authenticated(request).await;
        self.respond(request.url(), outcome)
    }

    /// Authenticated scan when a user id is given, anonymous otherwise.
    pub async fn scan_simple(
        &self,
        url: &str,
        user_id: Option<UserId>,
        page_insights: bool,
    ) -> ScanResult {
        let request = ScanRequest::builder(url)
            .maybe_user_id(user_id)
            .page_insights(page_insights)
            .no_store(user_id.is_none())
            .build();

        if request.user_id().is_some() {
            self.scan_authenticated(&request).await
        } else {
            self.scan_anonymous(&request).await
        }
    }

    /// Single-page scan for internal callers. Never publishes events.
    pub async fn core_scan(
        &self,
        url: &str,
        user_id: Option<UserId>,
        page_insights: bool,
    ) -> ScanResult {
        let request = ScanRequest::builder(url)
            .maybe_user_id(user_id)
            .page_insights(page_insights)
            .send_events(false)
            .build();

        if request.user_id().is_some() {
            self.scan_authenticated(&request).await
        } else {
            self.scan_anonymous(&request).await
        }
    }

    fn respond(&self, url: &str, outcome: Result<ScanData>) -> ScanResult {
        match outcome {
            Ok(data) => ScanResult::ok(data),
            Err(e) => {
                match &e {
                    ScanError::RenderTimeout => tracing::info!(url, "scan timed out: {e}"),
                    ScanError::InvalidTarget(_) => tracing::debug!(url, "scan rejected: {e}"),
                    _ => tracing::warn!(url, "scan failed: {e}"),
                }
                ScanResult::from_error(&e, self.timeout_ms)
            }
        }
    }

    fn resolve_target(&self, url: &str) -> Result<ScanTarget> {
        let target = ScanTarget::parse(url)?;
        if target.is_localhost() && self.environment != Environment::Development {
            return Err(ScanError::InvalidTarget(LOCALHOST_REJECTED.to_string()));
        }
        Ok(target)
    }

    async fn try_scan_anonymous(&self, request: &ScanRequest) -> Result<ScanData> {
        let target = self.resolve_target(request.url())?;

        let audit = AuditRequest {
            user_id: request.user_id(),
            ..AuditRequest::new(target.page_url())
        };
        let extracted = extract(self.engine.audit(audit).await?);

        let privileged = request.user_id().is_some() || self.super_mode;
        let website = Website::new(target.page_url(), target.domain(), request.user_id());
        let script = extracted
            .script
            .as_ref()
            .map(|report| script_record(&target, request.user_id(), report));

        self.build_data(extracted, &website, script, privileged)
    }

    async fn try_scan_authenticated(&self, request: &ScanRequest) -> Result<ScanData> {
        let user_id = request.user_id().ok_or(ScanError::MissingIdentity)?;
        let target = self.resolve_target(request.url())?;

        let account = self.store.find_account(user_id).await?;
        let stored = self.store.find_website(user_id, target.domain()).await?;

        // No account row is treated as the free tier
        let free_tier = account.as_ref().map_or(true, Account::is_free_tier);
        let page_insights = if free_tier {
            target.is_root()
        } else {
            request.page_insights_requested() || stored.as_ref().is_some_and(|w| w.page_insights)
        };
        let no_store = request.no_store() || free_tier || self.disable_store_scripts;

        let audit = AuditRequest {
            url: target.page_url().to_string(),
            page_headers: stored
                .as_ref()
                .map(|w| w.page_headers.clone())
                .unwrap_or_default(),
            user_id: Some(user_id),
            page_insights,
            no_store,
            scripts_enabled: true,
        };
        let extracted = extract(self.engine.audit(audit).await?);
        if !extracted.rendered() {
            return Err(ScanError::RenderTimeout);
        }

        let identity = PageIdentity {
            domain: target.domain().to_string(),
            user_id,
            page_url: target.page_url().to_string(),
            pathname: target.pathname().to_string(),
        };
        let base = stored
            .unwrap_or_else(|| Website::new(target.origin(), target.domain(), Some(user_id)));

        let outcome = self
            .coordinator
            .persist(
                &extracted,
                &identity,
                &base,
                PersistOptions {
                    send_events: request.send_events(),
                },
            )
            .await;
        if let Some(e) = outcome.partial_failure() {
            tracing::warn!(page_url = %identity.page_url, "{e}");
        }

        if request.send_email() {
            self.send_alert(account.as_ref(), &identity, &extracted).await;
        }

        let privileged = !free_tier || self.super_mode;
        self.build_data(extracted, &base, outcome.script, privileged)
    }

    async fn send_alert(
        &self,
        account: Option<&Account>,
        identity: &PageIdentity,
        extracted: &ExtractedAudit,
    ) {
        let Some(account) = account.filter(|a| a.accepts_alerts()) else {
            return;
        };

        let set = IssueSet {
            page_url: identity.page_url.clone(),
            domain: identity.domain.clone(),
            user_id: Some(identity.user_id),
            issues: extracted.issue_list().to_vec(),
        };
        if !set.has_errors() {
            return;
        }

        if let Err(e) = self.notifier.notify(account, &set).await {
            tracing::warn!(user_id = %identity.user_id, "failed to send issue alert: {e}");
        }
    }

    fn build_data(
        &self,
        extracted: ExtractedAudit,
        base: &Website,
        script: Option<ScriptRecord>,
        privileged: bool,
    ) -> Result<ScanData> {
        let snapshot = extracted.page.ok_or(ScanError::RenderTimeout)?;
        let mut website = base.with_snapshot(&snapshot, Utc::now());

        let limited = self
            .limiter
            .limit(extracted.issues.unwrap_or_default(), privileged);
        if limited.limited_count {
            let info = website.issues_info.take().unwrap_or_default();
            website.issues_info = Some(info.with_limited_count(limited.issues.len()));
        }

        Ok(ScanData {
            website,
            issues: limited.issues,
            script,
        })
    }
}

fn script_record(
    target: &ScanTarget,
    user_id: Option<UserId>,
    report: &pagewatch_audit::ScriptReport,
) -> ScriptRecord {
    ScriptRecord {
        page_url: target.page_url().to_string(),
        domain: target.domain().to_string(),
        user_id,
        script: report.script.clone(),
        cdn_url: report.cdn_url.clone(),
        cdn_url_minified: report.cdn_url_minified.clone(),
        script_meta: Some(report.script_meta.unwrap_or_default()),
    }
}
