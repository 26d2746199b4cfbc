//! Account lookups.
//!
//! Accounts are written by the authentication layer. The scan pipeline only
//! reads role and alert preferences from here.

use crate::error::Result;
use pagewatch_core::{Account, UserId};
use sqlx::{Pool, Row, Sqlite};

/// Find an account by id.
///
/// # Errors
/// Returns `DatabaseError` if the query fails.
pub async fn find_account(pool: &Pool<Sqlite>, user_id: UserId) -> Result<Option<Account>> {
    let row = sqlx::query(
        "SELECT id, role, alert_enabled, email_confirmed, email FROM users WHERE id = ?",
    )
    .bind(user_id.get())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(r) => {
            let role: i64 = r.try_get("role")?;
            Ok(Some(Account {
                id: UserId::new(r.try_get("id")?),
                role: u8::try_from(role).unwrap_or(u8::MAX),
                alert_enabled: r.try_get("alert_enabled")?,
                email_confirmed: r.try_get("email_confirmed")?,
                email: r.try_get("email")?,
            }))
        }
        None => Ok(None),
    }
}

/// Insert or replace an account.
///
/// # Errors
/// Returns `DatabaseError` if the write fails.
pub async fn upsert_account(pool: &Pool<Sqlite>, account: &Account) -> Result<()> {
    sqlx::query(
        "INSERT INTO users (id, role, alert_enabled, email_confirmed, email)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
            role = excluded.role,
            alert_enabled = excluded.alert_enabled,
            email_confirmed = excluded.email_confirmed,
            email = excluded.email",
    )
    .bind(account.id.get())
    .bind(i64::from(account.role))
    .bind(account.alert_enabled)
    .bind(account.email_confirmed)
    .bind(&account.email)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn setup_test_db() -> Database {
        let db = Database::new(":memory:").await.expect("create database");
        db.run_migrations().await.expect("run migrations");
        db
    }

    #[tokio::test]
    async fn test_account_roundtrip() {
        let db = setup_test_db().await;
        let account = Account {
            id: UserId::new(42),
            role: 1,
            alert_enabled: true,
            email_confirmed: true,
            email: Some("owner@example.com".to_string()),
        };

        upsert_account(db.pool(), &account).await.expect("upsert account");
        let found = find_account(db.pool(), UserId::new(42))
            .await
            .expect("find account")
            .expect("account exists");
        assert_eq!(found, account);
    }

    #[tokio::test]
    async fn test_missing_account() {
        let db = setup_test_db().await;
        let found = find_account(db.pool(), UserId::new(404))
            .await
            .expect("find account");
        assert!(found.is_none());
    }
}
