//! Crawled page records, keyed by `(page_url, user_id)`.

use crate::error::Result;
use pagewatch_core::{Page, UserId};
use sqlx::{Pool, Row, Sqlite};

/// Find the stored page row for a URL.
///
/// # Errors
/// Returns `DatabaseError` if the query fails or the row can't be decoded.
pub async fn find_page(pool: &Pool<Sqlite>, user_id: UserId, page_url: &str) -> Result<Option<Page>> {
    let row = sqlx::query("SELECT data FROM pages WHERE page_url = ? AND user_id = ?")
        .bind(page_url)
        .bind(user_id.get())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(r) => {
            let data: String = r.try_get("data")?;
            Ok(Some(serde_json::from_str(&data)?))
        }
        None => Ok(None),
    }
}

/// List a user's pages for a domain, ordered by URL.
///
/// # Errors
/// Returns `DatabaseError` if the query fails or a row can't be decoded.
pub async fn find_pages(pool: &Pool<Sqlite>, user_id: UserId, domain: &str) -> Result<Vec<Page>> {
    let rows = sqlx::query(
        "SELECT data FROM pages WHERE domain = ? AND user_id = ? ORDER BY page_url LIMIT 2000",
    )
    .bind(domain)
    .bind(user_id.get())
    .fetch_all(pool)
    .await?;

    let mut pages = Vec::with_capacity(rows.len());
    for row in rows {
        let data: String = row.try_get("data")?;
        pages.push(serde_json::from_str(&data)?);
    }
    Ok(pages)
}

/// Insert or replace a page row.
///
/// # Errors
/// Returns `DatabaseError` if serialization or the write fails.
pub async fn upsert_page(pool: &Pool<Sqlite>, page: &Page) -> Result<()> {
    let data = serde_json::to_string(page)?;

    sqlx::query(
        "INSERT INTO pages (page_url, user_id, domain, data, updated_at)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(page_url, user_id) DO UPDATE SET
            domain = excluded.domain,
            data = excluded.data,
            updated_at = excluded.updated_at",
    )
    .bind(page.page_url())
    .bind(page.user_id.get())
    .bind(&page.snapshot.domain)
    .bind(&data)
    .bind(page.timestamp.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use chrono::Utc;
    use pagewatch_core::PageSnapshot;

    async fn setup_test_db() -> Database {
        let db = Database::new(":memory:").await.expect("create database");
        db.run_migrations().await.expect("run migrations");
        db
    }

    fn sample_page(url: &str, online: bool) -> Page {
        Page {
            user_id: UserId::new(5),
            snapshot: PageSnapshot {
                url: url.to_string(),
                domain: "example.com".to_string(),
                cdn_connected: false,
                online,
                issues_info: None,
                insight: None,
                html: None,
                last_scan_date: None,
                page_load_time: None,
            },
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_row() {
        let db = setup_test_db().await;
        let url = "https://example.com/about";

        upsert_page(db.pool(), &sample_page(url, false)).await.expect("first upsert");
        upsert_page(db.pool(), &sample_page(url, true)).await.expect("second upsert");

        let found = find_page(db.pool(), UserId::new(5), url)
            .await
            .expect("find")
            .expect("page exists");
        assert!(found.snapshot.online);

        let pages = find_pages(db.pool(), UserId::new(5), "example.com")
            .await
            .expect("list");
        assert_eq!(pages.len(), 1);
    }

    #[tokio::test]
    async fn test_find_page_other_user() {
        let db = setup_test_db().await;
        upsert_page(db.pool(), &sample_page("https://example.com", true))
            .await
            .expect("upsert");

        let found = find_page(db.pool(), UserId::new(6), "https://example.com")
            .await
            .expect("find");
        assert!(found.is_none());
    }
}
