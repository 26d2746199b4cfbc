//! Persistence seam used by the scan pipeline.

use crate::error::Result;
use crate::{analytics, issues, pages, scripts, users, websites, Database};
use async_trait::async_trait;
use pagewatch_core::{Account, AnalyticsRecord, IssueSet, Page, ScriptRecord, UserId, Website};

/// Reads and idempotent writes needed to persist one audit result.
///
/// Every upsert is keyed by the record's identity, so replaying the same
/// result leaves one logical record per kind.
#[async_trait]
pub trait ScanStore: Send + Sync {
    /// Look up an account.
    async fn find_account(&self, user_id: UserId) -> Result<Option<Account>>;

    /// Look up a user's website by domain.
    async fn find_website(&self, user_id: UserId, domain: &str) -> Result<Option<Website>>;

    /// Look up a stored page row.
    async fn find_page(&self, user_id: UserId, page_url: &str) -> Result<Option<Page>>;

    /// Look up a stored script.
    async fn find_script(&self, user_id: UserId, page_url: &str) -> Result<Option<ScriptRecord>>;

    /// Write per-page counters.
    async fn upsert_analytics(&self, record: &AnalyticsRecord) -> Result<()>;

    /// Write the issue list for a page.
    async fn upsert_issues(&self, set: &IssueSet) -> Result<()>;

    /// Write a website record.
    async fn upsert_website(&self, website: &Website) -> Result<()>;

    /// Write a script.
    async fn upsert_script(&self, script: &ScriptRecord) -> Result<()>;

    /// Write a page row.
    async fn upsert_page(&self, page: &Page) -> Result<()>;
}

#[async_trait]
impl ScanStore for Database {
    async fn find_account(&self, user_id: UserId) -> Result<Option<Account>> {
        users::find_account(self.pool(), user_id).await
    }

    async fn find_website(&self, user_id: UserId, domain: &str) -> Result<Option<Website>> {
        websites::find_website(self.pool(), user_id, domain).await
    }

    async fn find_page(&self, user_id: UserId, page_url: &str) -> Result<Option<Page>> {
        pages::find_page(self.pool(), user_id, page_url).await
    }

    async fn find_script(&self, user_id: UserId, page_url: &str) -> Result<Option<ScriptRecord>> {
        scripts::find_script(self.pool(), user_id, page_url).await
    }

    async fn upsert_analytics(&self, record: &AnalyticsRecord) -> Result<()> {
        analytics::upsert_analytics(self.pool(), record).await
    }

    async fn upsert_issues(&self, set: &IssueSet) -> Result<()> {
        issues::upsert_issues(self.pool(), set).await
    }

    async fn upsert_website(&self, website: &Website) -> Result<()> {
        websites::upsert_website(self.pool(), website).await
    }

    async fn upsert_script(&self, script: &ScriptRecord) -> Result<()> {
        scripts::upsert_script(self.pool(), script).await
    }

    async fn upsert_page(&self, page: &Page) -> Result<()> {
        pages::upsert_page(self.pool(), page).await
    }
}
