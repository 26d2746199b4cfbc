//! Generated fix scripts, keyed by `(page_url, user_id)`.

use crate::error::{DatabaseError, Result};
use chrono::Utc;
use pagewatch_core::{ScriptRecord, UserId};
use sqlx::{Pool, Row, Sqlite};

/// Find the stored script for a page.
///
/// # Errors
/// Returns `DatabaseError` if the query fails or the row can't be decoded.
pub async fn find_script(
    pool: &Pool<Sqlite>,
    user_id: UserId,
    page_url: &str,
) -> Result<Option<ScriptRecord>> {
    let row = sqlx::query("SELECT data FROM scripts WHERE page_url = ? AND user_id = ?")
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

/// Insert or replace a script.
///
/// # Errors
/// Returns `DatabaseError::MissingOwner` for anonymous scripts, or a query error.
pub async fn upsert_script(pool: &Pool<Sqlite>, script: &ScriptRecord) -> Result<()> {
    let user_id = script.user_id.ok_or(DatabaseError::MissingOwner("script"))?;
    let data = serde_json::to_string(script)?;

    sqlx::query(
        "INSERT INTO scripts (page_url, user_id, domain, data, updated_at)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(page_url, user_id) DO UPDATE SET
            domain = excluded.domain,
            data = excluded.data,
            updated_at = excluded.updated_at",
    )
    .bind(&script.page_url)
    .bind(user_id.get())
    .bind(&script.domain)
    .bind(&data)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}
