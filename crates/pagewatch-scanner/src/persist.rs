//! Multi-record persistence of one audit result.
//!
//! This module provides the `PersistenceCoordinator`, which turns an
//! [`ExtractedAudit`] into the five records that share one page identity and
//! writes them concurrently. Writes are best effort: a failing upsert is
//! logged and recorded in the [`CommitOutcome`] while its siblings continue.
//! Nothing is retried.

use crate::error::ScanError;
use crate::extract::ExtractedAudit;
use chrono::Utc;
use pagewatch_core::{AnalyticsRecord, IssueSet, Page, PageIdentity, ScriptRecord, Website};
use pagewatch_db::{Result as DbResult, ScanStore};
use pagewatch_events::{DomainEvent, EventPublisher};
use std::fmt;
use std::sync::Arc;

/// Kind of record written for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum EntityKind {
    Analytics,
    Issues,
    Website,
    Script,
    Page,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Analytics => "analytics",
            Self::Issues => "issues",
            Self::Website => "website",
            Self::Script => "script",
            Self::Page => "page",
        };
        f.write_str(name)
    }
}

/// Per-call persistence switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistOptions {
    /// Publish change events for this result
    pub send_events: bool,
}

impl Default for PersistOptions {
    fn default() -> Self {
        Self { send_events: true }
    }
}

/// What a [`PersistenceCoordinator::persist`] call wrote.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitOutcome {
    /// Records written
    pub written: Vec<EntityKind>,
    /// Records whose upsert failed
    pub failed: Vec<EntityKind>,
    /// True when no page row existed before this result
    pub page_created: bool,
    /// Script record built for the page, if the engine generated one
    pub script: Option<ScriptRecord>,
}

impl CommitOutcome {
    /// The failure to report when some upserts did not go through.
    #[must_use]
    pub fn partial_failure(&self) -> Option<ScanError> {
        if self.failed.is_empty() {
            None
        } else {
            Some(ScanError::PersistencePartialFailure {
                failed: self.failed.clone(),
            })
        }
    }

    fn record(&mut self, kind: EntityKind, result: Option<DbResult<()>>, identity: &PageIdentity) {
        match result {
            Some(Ok(())) => self.written.push(kind),
            Some(Err(e)) => {
                tracing::error!(
                    page_url = %identity.page_url,
                    user_id = %identity.user_id,
                    "failed to upsert {kind}: {e}"
                );
                self.failed.push(kind);
            }
            None => {}
        }
    }
}

/// Writes the records derived from one audit result.
pub struct PersistenceCoordinator {
    store: Arc<dyn ScanStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl PersistenceCoordinator {
    /// Create a coordinator over a store and a publisher.
    #[must_use]
    pub fn new(store: Arc<dyn ScanStore>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { store, publisher }
    }

    /// Persist `extracted` under `identity`.
    ///
    /// `base` is the stored website, or a fresh one when the account has not
    /// registered the domain; it is only written when the page is the domain
    /// root. Events go out before the upserts start.
    pub async fn persist(
        &self,
        extracted: &ExtractedAudit,
        identity: &PageIdentity,
        base: &Website,
        options: PersistOptions,
    ) -> CommitOutcome {
        let mut outcome = CommitOutcome::default();

        let Some(reported) = extracted.page.as_ref() else {
            tracing::debug!(page_url = %identity.page_url, "nothing rendered, skipping persistence");
            return outcome;
        };
        let now = Utc::now();
        // The engine may echo a different form of the URL; every row uses the identity key
        let page = Page::for_identity(identity, reported, now);
        let snapshot = &page.snapshot;

        let (prior_page, prior_script) = tokio::join!(
            self.store.find_page(identity.user_id, &identity.page_url),
            self.store.find_script(identity.user_id, &identity.page_url),
        );

        // A failed read must not announce an existing page as new
        outcome.page_created = match prior_page {
            Ok(page) => page.is_none(),
            Err(e) => {
                tracing::warn!(page_url = %identity.page_url, "failed to read prior page: {e}");
                false
            }
        };
        let prior_meta = match prior_script {
            Ok(script) => script.and_then(|s| s.script_meta),
            Err(e) => {
                tracing::warn!(page_url = %identity.page_url, "failed to read prior script: {e}");
                None
            }
        };

        let issue_set = IssueSet {
            page_url: identity.page_url.clone(),
            domain: identity.domain.clone(),
            user_id: Some(identity.user_id),
            issues: extracted.issue_list().to_vec(),
        };

        if options.send_events {
            if !issue_set.issues.is_empty() {
                self.publisher
                    .publish_best_effort(DomainEvent::issue_added(
                        identity.user_id,
                        issue_set.clone(),
                    ))
                    .await;
            }
            if outcome.page_created {
                self.publisher
                    .publish_best_effort(DomainEvent::subdomain_added(identity.user_id, snapshot))
                    .await;
            }
        }

        let analytics = AnalyticsRecord {
            page_url: identity.page_url.clone(),
            domain: identity.domain.clone(),
            user_id: identity.user_id,
            error_count: extracted.error_count,
            warning_count: extracted.warning_count,
            notice_count: extracted.notice_count,
            ada_score: extracted.ada_score,
        };
        let website = identity.is_root().then(|| base.with_snapshot(snapshot, now));
        let script = extracted.script.as_ref().map(|report| ScriptRecord {
            page_url: identity.page_url.clone(),
            domain: identity.domain.clone(),
            user_id: Some(identity.user_id),
            script: report.script.clone(),
            cdn_url: report.cdn_url.clone(),
            cdn_url_minified: report.cdn_url_minified.clone(),
            script_meta: Some(report.script_meta.or(prior_meta).unwrap_or_default()),
        });
        let (analytics_res, issues_res, website_res, script_res, page_res) = tokio::join!(
            self.store.upsert_analytics(&analytics),
            self.store.upsert_issues(&issue_set),
            async {
                match &website {
                    Some(website) => Some(self.store.upsert_website(website).await),
                    None => None,
                }
            },
            async {
                match &script {
                    Some(script) => Some(self.store.upsert_script(script).await),
                    None => None,
                }
            },
            self.store.upsert_page(&page),
        );

        outcome.record(EntityKind::Analytics, Some(analytics_res), identity);
        outcome.record(EntityKind::Issues, Some(issues_res), identity);
        outcome.record(EntityKind::Website, website_res, identity);
        outcome.record(EntityKind::Script, script_res, identity);
        outcome.record(EntityKind::Page, Some(page_res), identity);
        outcome.script = script;

        tracing::debug!(
            page_url = %identity.page_url,
            written = outcome.written.len(),
            failed = outcome.failed.len(),
            page_created = outcome.page_created,
            "audit result persisted"
        );

        outcome
    }
}
