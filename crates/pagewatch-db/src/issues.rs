//! Issue records, keyed by `(page_url, user_id)`.
//!
//! Lookups by page try an ordered plan of progressively wider keys so a page
//! that was never scanned for this account can still show the issues another
//! scan recorded for the same URL or domain.

use crate::error::{DatabaseError, Result};
use chrono::Utc;
use pagewatch_core::{IssueSet, ScanTarget, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

/// Upper bound on rows returned by [`find_issues`].
pub const MAX_ISSUE_ROWS: u32 = 2000;

/// One tier of an issue lookup plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueLookup {
    /// The account's own record for the page
    Exact {
        /// Page URL
        page_url: String,
        /// Owning account
        user_id: UserId,
    },
    /// Any account's record for the page
    PageUrl(String),
    /// Any record for the domain
    Domain(String),
}

/// Build the fallback plan for a page lookup.
///
/// Tiers are exact `(page_url, user_id)`, then `page_url` alone, then the
/// page's domain. The exact tier is skipped without a user id and the domain
/// tier is skipped when no domain can be derived.
#[must_use]
pub fn issue_lookup_plan(page_url: &str, user_id: Option<UserId>) -> Vec<IssueLookup> {
    let mut plan = Vec::with_capacity(3);

    if let Some(user_id) = user_id {
        plan.push(IssueLookup::Exact {
            page_url: page_url.to_string(),
            user_id,
        });
    }
    plan.push(IssueLookup::PageUrl(page_url.to_string()));
    if let Ok(target) = ScanTarget::parse(page_url) {
        plan.push(IssueLookup::Domain(target.domain().to_string()));
    }

    plan
}

fn decode_issue_set(row: &SqliteRow) -> Result<IssueSet> {
    let issues: String = row.try_get("issues")?;
    Ok(IssueSet {
        page_url: row.try_get("page_url")?,
        domain: row.try_get("domain")?,
        user_id: Some(UserId::new(row.try_get("user_id")?)),
        issues: serde_json::from_str(&issues)?,
    })
}

async fn find_by(pool: &Pool<Sqlite>, lookup: &IssueLookup) -> Result<Option<IssueSet>> {
    let row = match lookup {
        IssueLookup::Exact { page_url, user_id } => {
            sqlx::query(
                "SELECT page_url, user_id, domain, issues FROM issues WHERE page_url = ? AND user_id = ?",
            )
            .bind(page_url)
            .bind(user_id.get())
            .fetch_optional(pool)
            .await?
        }
        IssueLookup::PageUrl(page_url) => {
            sqlx::query(
                "SELECT page_url, user_id, domain, issues FROM issues WHERE page_url = ? ORDER BY id LIMIT 1",
            )
            .bind(page_url)
            .fetch_optional(pool)
            .await?
        }
        IssueLookup::Domain(domain) => {
            sqlx::query(
                "SELECT page_url, user_id, domain, issues FROM issues WHERE domain = ? ORDER BY id LIMIT 1",
            )
            .bind(domain)
            .fetch_optional(pool)
            .await?
        }
    };

    row.as_ref().map(decode_issue_set).transpose()
}

/// Try each tier of `plan` in order and return the first hit.
///
/// # Errors
/// Returns `DatabaseError` if a query fails or a row can't be decoded.
pub async fn find_issue(pool: &Pool<Sqlite>, plan: &[IssueLookup]) -> Result<Option<IssueSet>> {
    for lookup in plan {
        if let Some(found) = find_by(pool, lookup).await? {
            tracing::trace!(?lookup, "issue lookup hit");
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Exact `(page_url, user_id)` lookup with no fallback.
///
/// # Errors
/// Returns `DatabaseError` if the query fails or the row can't be decoded.
pub async fn find_issue_exact(
    pool: &Pool<Sqlite>,
    user_id: UserId,
    page_url: &str,
) -> Result<Option<IssueSet>> {
    find_by(
        pool,
        &IssueLookup::Exact {
            page_url: page_url.to_string(),
            user_id,
        },
    )
    .await
}

/// All issue records for a domain, sorted by page URL, capped at [`MAX_ISSUE_ROWS`].
///
/// Without a user id, records of every account are returned.
///
/// # Errors
/// Returns `DatabaseError` if the query fails or a row can't be decoded.
pub async fn find_issues(
    pool: &Pool<Sqlite>,
    domain: &str,
    user_id: Option<UserId>,
) -> Result<Vec<IssueSet>> {
    find_issues_paged(
        pool,
        domain,
        user_id,
        Paging {
            limit: MAX_ISSUE_ROWS,
            offset: 0,
        },
    )
    .await
}

/// Page window for [`find_issues_paged`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    /// Maximum rows returned
    pub limit: u32,
    /// Rows skipped
    pub offset: u32,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
        }
    }
}

/// Issue records for a domain, one page window at a time, sorted by page URL.
///
/// # Errors
/// Returns `DatabaseError` if the query fails or a row can't be decoded.
pub async fn find_issues_paged(
    pool: &Pool<Sqlite>,
    domain: &str,
    user_id: Option<UserId>,
    paging: Paging,
) -> Result<Vec<IssueSet>> {
    let rows = match user_id {
        Some(user_id) => {
            sqlx::query(
                "SELECT page_url, user_id, domain, issues FROM issues
                 WHERE domain = ? AND user_id = ? ORDER BY page_url LIMIT ? OFFSET ?",
            )
            .bind(domain)
            .bind(user_id.get())
            .bind(i64::from(paging.limit))
            .bind(i64::from(paging.offset))
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(
                "SELECT page_url, user_id, domain, issues FROM issues
                 WHERE domain = ? ORDER BY page_url LIMIT ? OFFSET ?",
            )
            .bind(domain)
            .bind(i64::from(paging.limit))
            .bind(i64::from(paging.offset))
            .fetch_all(pool)
            .await?
        }
    };

    rows.iter().map(decode_issue_set).collect()
}

/// Insert or replace the issue list for a page.
///
/// # Errors
/// Returns `DatabaseError::MissingOwner` for anonymous sets, or a query error.
pub async fn upsert_issues(pool: &Pool<Sqlite>, set: &IssueSet) -> Result<()> {
    let user_id = set.user_id.ok_or(DatabaseError::MissingOwner("issues"))?;
    let issues = serde_json::to_string(&set.issues)?;

    sqlx::query(
        "INSERT INTO issues (page_url, user_id, domain, issues, updated_at)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(page_url, user_id) DO UPDATE SET
            domain = excluded.domain,
            issues = excluded.issues,
            updated_at = excluded.updated_at",
    )
    .bind(&set.page_url)
    .bind(user_id.get())
    .bind(&set.domain)
    .bind(&issues)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}
