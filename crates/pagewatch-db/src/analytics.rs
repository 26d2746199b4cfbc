//! Per-page issue counters, keyed by `(page_url, user_id)`.

use crate::error::Result;
use chrono::Utc;
use pagewatch_core::{AnalyticsRecord, UserId};
use sqlx::{Pool, Row, Sqlite};

/// Find the counters for a page.
///
/// # Errors
/// Returns `DatabaseError` if the query fails.
pub async fn find_analytics(
    pool: &Pool<Sqlite>,
    user_id: UserId,
    page_url: &str,
) -> Result<Option<AnalyticsRecord>> {
    let row = sqlx::query(
        "SELECT page_url, user_id, domain, error_count, warning_count, notice_count, ada_score
         FROM analytics WHERE page_url = ? AND user_id = ?",
    )
    .bind(page_url)
    .bind(user_id.get())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(r) => Ok(Some(AnalyticsRecord {
            page_url: r.try_get("page_url")?,
            domain: r.try_get("domain")?,
            user_id: UserId::new(r.try_get("user_id")?),
            error_count: count_column(&r, "error_count")?,
            warning_count: count_column(&r, "warning_count")?,
            notice_count: count_column(&r, "notice_count")?,
            ada_score: r.try_get("ada_score")?,
        })),
        None => Ok(None),
    }
}

fn count_column(row: &sqlx::sqlite::SqliteRow, name: &str) -> Result<Option<u32>> {
    let value: Option<i64> = row.try_get(name)?;
    Ok(value.map(|v| u32::try_from(v).unwrap_or(u32::MAX)))
}

/// Insert or replace the counters for a page.
///
/// Unknown counts are stored as NULL rather than zero.
///
/// # Errors
/// Returns `DatabaseError` if the write fails.
pub async fn upsert_analytics(pool: &Pool<Sqlite>, record: &AnalyticsRecord) -> Result<()> {
    sqlx::query(
        "INSERT INTO analytics (page_url, user_id, domain, error_count, warning_count, notice_count, ada_score, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(page_url, user_id) DO UPDATE SET
            domain = excluded.domain,
            error_count = excluded.error_count,
            warning_count = excluded.warning_count,
            notice_count = excluded.notice_count,
            ada_score = excluded.ada_score,
            updated_at = excluded.updated_at",
    )
    .bind(&record.page_url)
    .bind(record.user_id.get())
    .bind(&record.domain)
    .bind(record.error_count.map(i64::from))
    .bind(record.warning_count.map(i64::from))
    .bind(record.notice_count.map(i64::from))
    .bind(record.ada_score)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}
