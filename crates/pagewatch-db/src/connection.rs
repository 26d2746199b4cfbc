//! Connection pool setup.

use crate::error::{DatabaseError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

const MEMORY_PATH: &str = ":memory:";

/// Open a `SQLite` connection pool.
///
/// `:memory:` opens a private in-memory database held by a single pinned
/// connection, so the schema survives for the lifetime of the pool. Any other
/// path is opened as a file, created if missing, in WAL mode.
///
/// # Errors
/// Returns `DatabaseError::Open` if the path is invalid or the pool cannot connect.
pub async fn open_pool(path: &str, max_connections: u32) -> Result<Pool<Sqlite>> {
    if path == MEMORY_PATH {
        let options = SqliteConnectOptions::from_str(MEMORY_PATH)
            .map_err(|e| DatabaseError::Open(format!("invalid connection string: {e}")))?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::Open(format!("failed to open in-memory database: {e}")))?;

        tracing::debug!("In-memory database pool created");
        return Ok(pool);
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await
        .map_err(|e| DatabaseError::Open(format!("failed to open {path}: {e}")))?;

    tracing::info!("Database pool created at {}", path);
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let pool = open_pool(":memory:", 5).await.expect("open in-memory pool");
        let one: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("query");
        assert_eq!(one, 1);
    }

    #[tokio::test]
    async fn test_open_file_creates_database() {
        let tmp = tempfile::TempDir::new().expect("create temp dir");
        let path = tmp.path().join("pagewatch.db");
        let path_str = path.to_str().expect("utf-8 path");

        let pool = open_pool(path_str, 2).await.expect("open file pool");
        pool.close().await;
        assert!(path.exists());
    }
}
