//! Pagewatch Database Layer
//!
//! Provides `SQLite` storage for websites, crawled pages, issues, scripts
//! and per-page analytics. Uses `SQLx` with embedded migrations.
//!
//! # Example
//!
//! ```ignore
//! use pagewatch_db::Database;
//!
//! let db = Database::new("pagewatch.db").await?;
//! db.run_migrations().await?;
//! ```
//!
//! # Design Principles
//!
//! - Records derived from one audit share the key `(page_url, user_id)`
//! - Every write is an `INSERT ... ON CONFLICT DO UPDATE`, so replays are harmless
//! - Anonymous records are rejected at the write boundary
//! - The scan pipeline talks to storage only through [`ScanStore`]

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod analytics;
pub mod connection;
pub mod error;
pub mod issues;
pub mod migrations;
pub mod pages;
pub mod scripts;
pub mod store;
pub mod users;
pub mod websites;

// Re-export commonly used types
pub use error::{DatabaseError, Result};
pub use issues::{issue_lookup_plan, IssueLookup, Paging};
pub use store::ScanStore;
pub use websites::WebsiteUpdate;

use pagewatch_core::{IssueSet, UserId, Website};
use sqlx::{Pool, Sqlite};

/// Default pool size for file-backed databases.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// High-level database interface.
///
/// Cloning is cheap; clones share the same pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open a database with the default pool size.
    ///
    /// # Arguments
    /// * `path` - Path to the database file (or `:memory:` for in-memory)
    ///
    /// # Errors
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new(path: &str) -> Result<Self> {
        Self::with_max_connections(path, DEFAULT_MAX_CONNECTIONS).await
    }

    /// Open a database with an explicit pool size.
    ///
    /// # Errors
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn with_max_connections(path: &str, max_connections: u32) -> Result<Self> {
        let pool = connection::open_pool(path, max_connections).await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Run all pending database migrations.
    ///
    /// # Errors
    /// Returns `DatabaseError::Migration` if any migration fails.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Get the current schema version.
    ///
    /// # Errors
    /// Returns `DatabaseError` if the version cannot be queried.
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(&self.pool).await
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close the connection pool.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }

    /// Partially update a website's audit configuration.
    ///
    /// # Errors
    /// Returns `DatabaseError::NotFoundWithMessage` if the website doesn't exist.
    pub async fn update_website(
        &self,
        user_id: UserId,
        url: &str,
        update: &WebsiteUpdate,
    ) -> Result<Website> {
        websites::update_website(&self.pool, user_id, url, update).await
    }

    /// Find issues for a page using the three-tier fallback plan.
    ///
    /// # Errors
    /// Returns `DatabaseError` if a query fails.
    pub async fn find_issue(
        &self,
        page_url: &str,
        user_id: Option<UserId>,
    ) -> Result<Option<IssueSet>> {
        issues::find_issue(&self.pool, &issue_lookup_plan(page_url, user_id)).await
    }

    /// All issue records for a domain, sorted by page URL.
    ///
    /// # Errors
    /// Returns `DatabaseError` if the query fails.
    pub async fn find_issues(
        &self,
        domain: &str,
        user_id: Option<UserId>,
    ) -> Result<Vec<IssueSet>> {
        issues::find_issues(&self.pool, domain, user_id).await
    }

    /// Issue records for a domain, one page window at a time.
    ///
    /// # Errors
    /// Returns `DatabaseError` if the query fails.
    pub async fn find_issues_paged(
        &self,
        domain: &str,
        user_id: Option<UserId>,
        paging: Paging,
    ) -> Result<Vec<IssueSet>> {
        issues::find_issues_paged(&self.pool, domain, user_id, paging).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_creation() {
        let db = Database::new(":memory:").await.expect("create database");

        let version_before = db.get_schema_version().await.expect("get version");
        assert_eq!(version_before, 0);

        db.run_migrations().await.expect("run migrations");

        let version_after = db.get_schema_version().await.expect("get version");
        assert_eq!(version_after, 2);
    }

    #[tokio::test]
    async fn test_database_schema() {
        let db = Database::new(":memory:").await.expect("create database");
        db.run_migrations().await.expect("run migrations");

        let website_columns: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info('websites') ORDER BY cid")
                .fetch_all(db.pool())
                .await
                .expect("query columns");

        assert_eq!(
            website_columns,
            vec!["id", "user_id", "domain", "url", "data", "updated_at"]
        );
    }

    #[tokio::test]
    async fn test_database_close() {
        let db = Database::new(":memory:").await.expect("create database");
        db.close().await; // Should not panic
    }
}
