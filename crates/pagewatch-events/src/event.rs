//! Topics and event payloads.

use pagewatch_core::{IssueSet, PageSnapshot, UserId, Website};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Channels subscribers can listen on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Topic {
    /// New issues found on a page
    IssueAdded,
    /// Issues changed on a page
    IssueUpdated,
    /// A page was crawled for the first time
    SubdomainAdded,
    /// A known page changed
    SubdomainUpdated,
    /// A website was registered
    WebsiteAdded,
    /// A website changed
    WebsiteUpdated,
    /// A website was removed
    WebsiteRemoved,
}

impl Topic {
    /// Wire name of the topic.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IssueAdded => "ISSUE_ADDED",
            Self::IssueUpdated => "ISSUE_UPDATED",
            Self::SubdomainAdded => "SUBDOMAIN_ADDED",
            Self::SubdomainUpdated => "SUBDOMAIN_UPDATED",
            Self::WebsiteAdded => "WEBSITE_ADDED",
            Self::WebsiteUpdated => "WEBSITE_UPDATED",
            Self::WebsiteRemoved => "WEBSITE_REMOVED",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum EventPayload {
    /// Issues of one page
    Issues(IssueSet),
    /// A crawled page, markup stripped
    Subdomain(PageSnapshot),
    /// A website record
    Website(Website),
}

/// A change notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    /// Channel the event is published on
    pub topic: Topic,
    /// Account the event belongs to; subscribers only see their own
    pub user_id: Option<UserId>,
    /// Event body
    pub payload: EventPayload,
}

impl DomainEvent {
    /// Issues were found on a page.
    #[must_use]
    pub fn issue_added(user_id: UserId, issues: IssueSet) -> Self {
        Self {
            topic: Topic::IssueAdded,
            user_id: Some(user_id),
            payload: EventPayload::Issues(issues),
        }
    }

    /// A page was crawled for the first time. Rendered markup is not sent.
    #[must_use]
    pub fn subdomain_added(user_id: UserId, page: &PageSnapshot) -> Self {
        Self {
            topic: Topic::SubdomainAdded,
            user_id: Some(user_id),
            payload: EventPayload::Subdomain(page.without_markup()),
        }
    }

    /// A website record changed.
    #[must_use]
    pub fn website_updated(user_id: UserId, website: Website) -> Self {
        Self {
            topic: Topic::WebsiteUpdated,
            user_id: Some(user_id),
            payload: EventPayload::Website(website),
        }
    }
}
