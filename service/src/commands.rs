//! Inbound entry points.
//!
//! Every entry point charges the caller's admission budget first. Scan entry
//! points always answer with a [`ScanResult`]; the rest return
//! [`CommandError`] on failure.

use crate::error::CommandError;
use crate::state::AppState;
use pagewatch_core::{IssueSet, ScanRequest, UserId, Website};
use pagewatch_crawl::{CrawlJob, CrawlStream, Ticket};
use pagewatch_db::{Paging, WebsiteUpdate};
use pagewatch_events::{DomainEvent, EventPublisher, SubscriberContext, Subscription, Topic};
use pagewatch_scanner::{CallerKey, EndpointClass, ScanResult};
use std::sync::Arc;

/// Scan one page; authenticated when `user_id` is given.
pub async fn scan_simple(
    state: &AppState,
    caller: CallerKey,
    url: &str,
    user_id: Option<UserId>,
    page_insights: bool,
) -> ScanResult {
    if let Err(e) = state.admission.check(&caller, EndpointClass::Scan).await {
        return ScanResult::from_error(&e, state.config.audit.timeout_ms);
    }
    state.handler.scan_simple(url, user_id, page_insights).await
}

/// Scan one page for an account.
///
/// With `send_email`, an account that accepts alerts is notified when the
/// page has errors.
pub async fn scan_authenticated(
    state: &AppState,
    caller: CallerKey,
    url: &str,
    user_id: UserId,
    page_insights: bool,
    send_email: bool,
) -> ScanResult {
    if let Err(e) = state.admission.check(&caller, EndpointClass::Scan).await {
        return ScanResult::from_error(&e, state.config.audit.timeout_ms);
    }
    let request = ScanRequest::builder(url)
        .user_id(user_id)
        .page_insights(page_insights)
        .send_email(send_email)
        .build();
    state.handler.scan_authenticated(&request).await
}

/// Single-page scan for internal RPC callers. Publishes no events.
pub async fn core_scan(
    state: &AppState,
    caller: CallerKey,
    url: &str,
    user_id: Option<UserId>,
    page_insights: bool,
) -> ScanResult {
    if let Err(e) = state.admission.check(&caller, EndpointClass::Scan).await {
        return ScanResult::from_error(&e, state.config.audit.timeout_ms);
    }
    state.handler.core_scan(url, user_id, page_insights).await
}

/// Start a site-wide crawl streaming into `stream`.
///
/// A rejected call closes the stream.
pub async fn submit_crawl(
    state: &AppState,
    caller: CallerKey,
    stream: Arc<CrawlStream>,
    job: CrawlJob,
) -> Result<Ticket, CommandError> {
    if let Err(e) = state.admission.check(&caller, EndpointClass::Scan).await {
        stream.close().await;
        return Err(e.into());
    }
    Ok(state.crawls.submit_crawl(stream, job).await?)
}

/// Change a website's audit configuration.
pub async fn update_website(
    state: &AppState,
    caller: CallerKey,
    user_id: UserId,
    url: &str,
    update: &WebsiteUpdate,
) -> Result<Website, CommandError> {
    state.admission.check(&caller, EndpointClass::Api).await?;
    let website = state.db.update_website(user_id, url, update).await?;
    tracing::debug!(domain = %website.domain, user_id = %user_id, "website updated");
    state
        .bus
        .publish_best_effort(DomainEvent::website_updated(user_id, website.clone()))
        .await;
    Ok(website)
}

/// Issues for a page, falling back to wider lookups when the account has none.
pub async fn get_issue(
    state: &AppState,
    caller: CallerKey,
    page_url: &str,
    user_id: Option<UserId>,
) -> Result<Option<IssueSet>, CommandError> {
    state.admission.check(&caller, EndpointClass::Api).await?;
    Ok(state.db.find_issue(page_url, user_id).await?)
}

/// Issue records of a domain, one page window at a time.
pub async fn get_issues(
    state: &AppState,
    caller: CallerKey,
    domain: &str,
    user_id: Option<UserId>,
    paging: Option<Paging>,
) -> Result<Vec<IssueSet>, CommandError> {
    state.admission.check(&caller, EndpointClass::Api).await?;
    let paging = paging.unwrap_or_default();
    Ok(state.db.find_issues_paged(domain, user_id, paging).await?)
}

/// Subscribe to one topic on behalf of an account.
#[must_use]
pub fn subscribe(state: &AppState, topic: Topic, user_id: UserId) -> Subscription {
    state.bus.subscribe(topic, SubscriberContext::for_user(user_id))
}
