//! Issue alert notifications.

use async_trait::async_trait;
use pagewatch_core::{Account, IssueSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("account {0} has no email address")]
    MissingAddress(i64),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Sends an alert to an account when a scan finds errors.
#[async_trait]
pub trait IssueNotifier: Send + Sync {
    async fn notify(&self, account: &Account, issues: &IssueSet) -> Result<(), NotifyError>;
}

/// Notifier that only records the alert in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl IssueNotifier for LogNotifier {
    async fn notify(&self, account: &Account, issues: &IssueSet) -> Result<(), NotifyError> {
        let email = account
            .email
            .as_deref()
            .ok_or(NotifyError::MissingAddress(account.id.get()))?;

        let errors = issues
            .issues
            .iter()
            .filter(|issue| issue.issue_type == pagewatch_core::IssueType::Error)
            .count();
        tracing::info!(
            user_id = %account.id,
            page_url = %issues.page_url,
            errors,
            "issue alert for {email}"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagewatch_core::UserId;

    fn account(email: Option<&str>) -> Account {
        Account {
            id: UserId::new(7),
            role: 1,
            alert_enabled: true,
            email_confirmed: true,
            email: email.map(str::to_string),
        }
    }

    fn empty_set() -> IssueSet {
        IssueSet {
            page_url: "https://example.com".to_string(),
            domain: "example.com".to_string(),
            user_id: Some(UserId::new(7)),
            issues: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_log_notifier() {
        LogNotifier
            .notify(&account(Some("ops@example.com")), &empty_set())
            .await
            .expect("notify");

        let err = LogNotifier
            .notify(&account(None), &empty_set())
            .await
            .expect_err("no address");
        assert!(matches!(err, NotifyError::MissingAddress(7)));
    }
}
