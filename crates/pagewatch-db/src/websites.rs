//! Website records, keyed by `(domain, user_id)`.
//!
//! The full record is stored as JSON in the `data` column; `domain`, `url`
//! and `user_id` are kept as columns for lookups.

use crate::error::{DatabaseError, Result};
use chrono::Utc;
use pagewatch_core::{sanitize_rules, sanitize_runners, PageHeader, ScanTarget, UserId, Website};
use sqlx::{Pool, Row, Sqlite};

/// Find the website a user registered for `domain`.
///
/// # Errors
/// Returns `DatabaseError` if the query fails or the stored record can't be decoded.
pub async fn find_website(
    pool: &Pool<Sqlite>,
    user_id: UserId,
    domain: &str,
) -> Result<Option<Website>> {
    let row = sqlx::query("SELECT data FROM websites WHERE domain = ? AND user_id = ?")
        .bind(domain)
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

/// List a user's websites ordered by domain.
///
/// # Errors
/// Returns `DatabaseError` if the query fails or a stored record can't be decoded.
pub async fn find_websites(pool: &Pool<Sqlite>, user_id: UserId) -> Result<Vec<Website>> {
    let rows = sqlx::query("SELECT data FROM websites WHERE user_id = ? ORDER BY domain")
        .bind(user_id.get())
        .fetch_all(pool)
        .await?;

    let mut websites = Vec::with_capacity(rows.len());
    for row in rows {
        let data: String = row.try_get("data")?;
        websites.push(serde_json::from_str(&data)?);
    }
    Ok(websites)
}

/// Insert or replace a website record.
///
/// # Errors
/// Returns `DatabaseError::MissingOwner` for anonymous records, or a query error.
pub async fn upsert_website(pool: &Pool<Sqlite>, website: &Website) -> Result<()> {
    let user_id = website.user_id.ok_or(DatabaseError::MissingOwner("website"))?;
    let data = serde_json::to_string(website)?;

    sqlx::query(
        "INSERT INTO websites (user_id, domain, url, data, updated_at)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(domain, user_id) DO UPDATE SET
            url = excluded.url,
            data = excluded.data,
            updated_at = excluded.updated_at",
    )
    .bind(user_id.get())
    .bind(&website.domain)
    .bind(&website.url)
    .bind(&data)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    tracing::debug!(domain = %website.domain, user_id = %user_id, "website upserted");
    Ok(())
}

/// Partial update of a website's audit configuration.
///
/// `None` fields keep the stored value. List fields are sanitized before
/// storage. `robots` is re-enabled when not supplied.
#[derive(Debug, Clone, Default)]
pub struct WebsiteUpdate {
    /// Headers to send with each audit; a single header with an empty key clears them
    pub page_headers: Option<Vec<PageHeader>>,
    /// Collect the insights report on every page
    pub page_insights: Option<bool>,
    /// Audit with a mobile viewport
    pub mobile: Option<bool>,
    /// Accessibility standard
    pub standard: Option<String>,
    /// Custom user agent
    pub ua: Option<String>,
    /// Follow other top level domains
    pub tld: Option<bool>,
    /// Follow subdomains
    pub subdomains: Option<bool>,
    /// Respect robots.txt
    pub robots: Option<bool>,
    /// Rules to run
    pub rules: Option<Vec<String>>,
    /// Rules to ignore
    pub ignore: Option<Vec<String>>,
    /// Runner names
    pub runners: Option<Vec<String>>,
}

impl WebsiteUpdate {
    /// A new website value with this update applied.
    #[must_use]
    pub fn apply(&self, website: &Website) -> Website {
        let mut updated = website.clone();

        if let Some(headers) = &self.page_headers {
            let clears = headers.len() == 1 && headers[0].key.is_empty();
            updated.page_headers = if clears { Vec::new() } else { headers.clone() };
        }
        if let Some(page_insights) = self.page_insights {
            updated.page_insights = page_insights;
        }
        if let Some(mobile) = self.mobile {
            updated.mobile = mobile;
        }
        if let Some(standard) = &self.standard {
            updated.standard = Some(standard.clone());
        }
        if let Some(ua) = &self.ua {
            updated.ua = Some(ua.clone());
        }
        if let Some(tld) = self.tld {
            updated.tld = tld;
        }
        if let Some(subdomains) = self.subdomains {
            updated.subdomains = subdomains;
        }
        updated.robots = self.robots.unwrap_or(true);
        if let Some(rules) = &self.rules {
            updated.rules = sanitize_rules(rules);
        }
        if let Some(ignore) = &self.ignore {
            updated.ignore = sanitize_rules(ignore);
        }
        if let Some(runners) = &self.runners {
            updated.runners = sanitize_runners(runners);
        }

        updated
    }
}

/// Apply a [`WebsiteUpdate`] to the website registered at `url`.
///
/// # Errors
/// Returns `DatabaseError::InvalidInput` if `url` has no domain,
/// `DatabaseError::NotFoundWithMessage` if the user has no such website,
/// or a query error.
pub async fn update_website(
    pool: &Pool<Sqlite>,
    user_id: UserId,
    url: &str,
    update: &WebsiteUpdate,
) -> Result<Website> {
    let target = ScanTarget::parse(url).map_err(|e| DatabaseError::InvalidInput(e.to_string()))?;

    let website = find_website(pool, user_id, target.domain())
        .await?
        .ok_or_else(|| {
            DatabaseError::NotFoundWithMessage(format!("website {} not found", target.domain()))
        })?;

    let updated = update.apply(&website);
    upsert_website(pool, &updated).await?;
    Ok(updated)
}
