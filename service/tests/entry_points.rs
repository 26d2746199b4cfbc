use async_trait::async_trait;
use pagewatch_audit::{AuditEngine, AuditError, AuditRequest, AuditResult, IssueReport, PageRecord};
use pagewatch_core::{
    Account, AppConfig, Issue, IssueSet, IssueType, IssuesInfo, UserId, Website,
};
use pagewatch_crawl::{ChannelSink, CrawlJob, CrawlStream};
use pagewatch_db::{ScanStore, WebsiteUpdate};
use pagewatch_events::Topic;
use pagewatch_scanner::{CallerKey, IssueNotifier, NotifyError};
use pagewatch_service::{commands, AppState};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Engine that renders every page with one error.
struct OneIssueEngine;

#[async_trait]
impl AuditEngine for OneIssueEngine {
    async fn audit(&self, request: AuditRequest) -> Result<AuditResult, AuditError> {
        Ok(AuditResult {
            page: Some(PageRecord {
                url: request.url.clone(),
                domain: "example.com".to_string(),
                cdn_connected: false,
                online: true,
                issues_info: Some(IssuesInfo {
                    error_count: 1,
                    ..IssuesInfo::default()
                }),
                insight: None,
                html: None,
                last_scan_date: None,
                page_load_time: None,
            }),
            script: None,
            issues: Some(IssueReport {
                issues: vec![Issue {
                    issue_type: IssueType::Error,
                    rule: "WCAG2AA.Principle1.Guideline1_1.1_1_1.H37".to_string(),
                    selector: "img".to_string(),
                    message: Some("Img element missing an alt attribute.".to_string()),
                    context: None,
                    runner: Some("htmlcs".to_string()),
                    recurrence: None,
                }],
            }),
        })
    }
}

async fn state_with(configure: impl FnOnce(&mut AppConfig)) -> AppState {
    let mut config = AppConfig::default();
    config.database.path = ":memory:".to_string();
    configure(&mut config);
    AppState::with_engine(config, Arc::new(OneIssueEngine))
        .await
        .expect("build state")
}

/// Notifier that keeps the page of every alert.
#[derive(Default)]
struct CountingNotifier {
    sent: Mutex<Vec<String>>,
}

#[async_trait]
impl IssueNotifier for CountingNotifier {
    async fn notify(&self, _account: &Account, issues: &IssueSet) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .expect("sent lock")
            .push(issues.page_url.clone());
        Ok(())
    }
}

fn ip_caller() -> CallerKey {
    CallerKey::Ip(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7)))
}

#[tokio::test]
async fn test_scan_budget_enforced() {
    let state = state_with(|config| config.limits.scan_max = 1).await;

    let first = commands::scan_simple(&state, ip_caller(), "https://example.com", None, false).await;
    assert_eq!(first.code, 200);

    let second =
        commands::scan_simple(&state, ip_caller(), "https://example.com", None, false).await;
    assert_eq!(second.code, 429);
    assert!(!second.success);

    // Other callers keep their own budget
    let other = commands::core_scan(
        &state,
        CallerKey::User(UserId::new(1)),
        "https://example.com",
        None,
        false,
    )
    .await;
    assert_eq!(other.code, 200);
}

#[tokio::test]
async fn test_authenticated_scan_reaches_subscriber() {
    let state = state_with(|_| {}).await;
    let user = UserId::new(42);
    let mut issues = commands::subscribe(&state, Topic::IssueAdded, user);
    let mut others = commands::subscribe(&state, Topic::IssueAdded, UserId::new(43));

    let result = commands::scan_authenticated(
        &state,
        CallerKey::User(user),
        "https://example.com/about",
        user,
        false,
        false,
    )
    .await;
    assert_eq!(result.code, 200);

    let event = tokio::time::timeout(Duration::from_secs(1), issues.next())
        .await
        .expect("event delivered")
        .expect("bus open");
    assert_eq!(event.topic, Topic::IssueAdded);
    assert_eq!(event.user_id, Some(user));

    assert!(
        tokio::time::timeout(Duration::from_millis(50), others.next())
            .await
            .is_err(),
        "other accounts must not see the event"
    );

    let stored = commands::get_issue(
        &state,
        CallerKey::User(user),
        "https://example.com/about",
        Some(user),
    )
    .await
    .expect("get issue")
    .expect("issues stored");
    assert_eq!(stored.issues.len(), 1);
}

#[tokio::test]
async fn test_crawl_through_entry_point() {
    let state = state_with(|_| {}).await;
    let user = UserId::new(7);
    let (sink, mut updates) = ChannelSink::new(8);
    let stream = Arc::new(CrawlStream::new(sink));

    commands::submit_crawl(
        &state,
        CallerKey::User(user),
        stream,
        CrawlJob {
            pages: vec![
                "https://example.com".to_string(),
                "https://example.com/contact".to_string(),
            ],
            user_id: Some(user),
            domain: "example.com".to_string(),
            full: false,
        },
    )
    .await
    .expect("submit crawl");

    let mut received = Vec::new();
    while let Ok(Some(update)) = tokio::time::timeout(Duration::from_secs(5), updates.recv()).await {
        received.push(update);
    }
    assert_eq!(received.len(), 2);
    assert!(received.iter().all(|u| u.code == 200));

    let issues = commands::get_issues(&state, CallerKey::User(user), "example.com", Some(user), None)
        .await
        .expect("list issues");
    assert_eq!(issues.len(), 2);
}

#[tokio::test]
async fn test_rate_limited_crawl_closes_stream() {
    let state = state_with(|config| config.limits.scan_max = 0).await;
    let (sink, mut updates) = ChannelSink::new(8);
    let stream = Arc::new(CrawlStream::new(sink));

    let err = commands::submit_crawl(
        &state,
        ip_caller(),
        stream.clone(),
        CrawlJob {
            pages: vec!["https://example.com".to_string()],
            user_id: None,
            domain: "example.com".to_string(),
            full: true,
        },
    )
    .await
    .expect_err("over budget");
    assert_eq!(err.code, "RATE_LIMITED");
    assert!(stream.is_closed());
    assert!(updates.recv().await.is_none());
}

#[tokio::test]
async fn test_update_website_entry_point() {
    let state = state_with(|_| {}).await;
    let user = UserId::new(3);
    state
        .db
        .upsert_website(&Website::new("https://example.com", "example.com", Some(user)))
        .await
        .expect("store website");
    let mut updates = commands::subscribe(&state, Topic::WebsiteUpdated, user);

    let update = WebsiteUpdate {
        runners: Some(vec!["axe".to_string(), "unknown".to_string()]),
        page_insights: Some(true),
        ..WebsiteUpdate::default()
    };
    let website =
        commands::update_website(&state, CallerKey::User(user), user, "https://example.com", &update)
            .await
            .expect("update website");
    assert!(website.page_insights);
    assert_eq!(website.runners.len(), 1);

    let event = tokio::time::timeout(Duration::from_secs(1), updates.next())
        .await
        .expect("update event in time")
        .expect("bus open");
    assert_eq!(event.topic, Topic::WebsiteUpdated);
    assert_eq!(event.user_id, Some(user));

    let err = commands::update_website(
        &state,
        CallerKey::User(user),
        user,
        "https://missing.example.com",
        &update,
    )
    .await
    .expect_err("missing website");
    assert_eq!(err.code, "NOT_FOUND");
}

#[tokio::test]
async fn test_authenticated_scan_alert_opt_in() {
    let mut config = AppConfig::default();
    config.database.path = ":memory:".to_string();
    let notifier = Arc::new(CountingNotifier::default());
    let state = AppState::with_notifier(config, Arc::new(OneIssueEngine), notifier.clone())
        .await
        .expect("build state");

    let user = UserId::new(8);
    pagewatch_db::users::upsert_account(
        state.db.pool(),
        &Account {
            id: user,
            role: 1,
            alert_enabled: true,
            email_confirmed: true,
            email: Some("owner@example.com".to_string()),
        },
    )
    .await
    .expect("store account");

    let url = "https://example.com/pricing";
    let quiet =
        commands::scan_authenticated(&state, CallerKey::User(user), url, user, false, false).await;
    assert_eq!(quiet.code, 200);
    assert!(notifier.sent.lock().expect("sent lock").is_empty());

    let alerted =
        commands::scan_authenticated(&state, CallerKey::User(user), url, user, false, true).await;
    assert_eq!(alerted.code, 200);
    assert_eq!(*notifier.sent.lock().expect("sent lock"), vec![url.to_string()]);
}
