//! Shared types used across the Pagewatch pipeline.
//!
//! This module defines common newtypes and enums that provide type safety
//! and clear domain modeling.

use crate::error::PagewatchError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Newtype for account identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw account id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw id value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// An account as seen by the scan pipeline. Read-only to the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account id
    pub id: UserId,
    /// Plan role; `0` is the free tier
    pub role: u8,
    /// Whether issue alert emails are enabled
    pub alert_enabled: bool,
    /// Whether the account email has been confirmed
    pub email_confirmed: bool,
    /// Contact address for alerts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Account {
    /// True for accounts on the free plan.
    #[must_use]
    pub fn is_free_tier(&self) -> bool {
        self.role == 0
    }

    /// True when this account may receive issue alert emails.
    #[must_use]
    pub fn accepts_alerts(&self) -> bool {
        self.alert_enabled && self.email_confirmed && self.email.is_some()
    }
}

/// Accessibility runners the audit engine can execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Runner {
    /// HTML_CodeSniffer
    Htmlcs,
    /// axe-core
    Axe,
}

impl Runner {
    /// Parse a runner name. Only exact lowercase names are accepted.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "htmlcs" => Some(Self::Htmlcs),
            "axe" => Some(Self::Axe),
            _ => None,
        }
    }

    /// Wire name of the runner.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Htmlcs => "htmlcs",
            Self::Axe => "axe",
        }
    }
}

impl fmt::Display for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Runner {
    type Err = PagewatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| PagewatchError::Validation(format!("unknown runner '{s}'")))
    }
}

/// Identity shared by every record persisted from one audit result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageIdentity {
    /// Host of the audited page
    pub domain: String,
    /// Owning account
    pub user_id: UserId,
    /// Normalized page URL
    pub page_url: String,
    /// Path component; `/` for a domain root
    pub pathname: String,
}

impl PageIdentity {
    /// True when the identity points at the domain root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.pathname == "/"
    }
}

/// An inbound scan request.
///
/// Built per call through [`ScanRequest::builder`] and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    url: String,
    user_id: Option<UserId>,
    page_insights_requested: bool,
    no_store: bool,
    send_events: bool,
    send_email: bool,
}

impl ScanRequest {
    /// Start building a request for `url`.
    #[must_use]
    pub fn builder(url: impl Into<String>) -> ScanRequestBuilder {
        ScanRequestBuilder::new(url)
    }

    /// Raw target URL as supplied by the caller.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Caller account, if authenticated.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Whether the caller asked for the performance insights report.
    #[must_use]
    pub fn page_insights_requested(&self) -> bool {
        self.page_insights_requested
    }

    /// Whether the caller asked the engine not to store scripts.
    #[must_use]
    pub fn no_store(&self) -> bool {
        self.no_store
    }

    /// Whether change events should be published for this scan.
    #[must_use]
    pub fn send_events(&self) -> bool {
        self.send_events
    }

    /// Whether an issue alert email may be sent for this scan.
    #[must_use]
    pub fn send_email(&self) -> bool {
        self.send_email
    }
}

/// Builder for [`ScanRequest`].
#[derive(Debug, Clone)]
pub struct ScanRequestBuilder {
    inner: ScanRequest,
}

impl ScanRequestBuilder {
    fn new(url: impl Into<String>) -> Self {
        Self {
            inner: ScanRequest {
                url: url.into(),
                user_id: None,
                page_insights_requested: false,
                no_store: false,
                send_events: true,
                send_email: false,
            },
        }
    }

    /// Attach the caller account.
    #[must_use]
    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.inner.user_id = Some(user_id);
        self
    }

    /// Attach an optional caller account.
    #[must_use]
    pub fn maybe_user_id(mut self, user_id: Option<UserId>) -> Self {
        self.inner.user_id = user_id;
        self
    }

    /// Request the performance insights report.
    #[must_use]
    pub fn page_insights(mut self, requested: bool) -> Self {
        self.inner.page_insights_requested = requested;
        self
    }

    /// Ask the engine not to store scripts.
    #[must_use]
    pub fn no_store(mut self, no_store: bool) -> Self {
        self.inner.no_store = no_store;
        self
    }

    /// Enable or disable event publication (enabled by default).
    #[must_use]
    pub fn send_events(mut self, send: bool) -> Self {
        self.inner.send_events = send;
        self
    }

    /// Allow an issue alert email for this scan.
    #[must_use]
    pub fn send_email(mut self, send: bool) -> Self {
        self.inner.send_email = send;
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> ScanRequest {
        self.inner
    }
}
