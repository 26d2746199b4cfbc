//! Publisher seam.

use crate::error::PublishError;
use crate::event::DomainEvent;
use async_trait::async_trait;

/// Hands events to whatever transport delivers them to subscribers.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one event.
    async fn publish(&self, event: DomainEvent) -> Result<(), PublishError>;

    /// Publish one event, logging and swallowing any failure.
    async fn publish_best_effort(&self, event: DomainEvent) {
        let topic = event.topic;
        if let Err(e) = self.publish(event).await {
            tracing::warn!(%topic, "failed to publish event: {e}");
        }
    }
}
