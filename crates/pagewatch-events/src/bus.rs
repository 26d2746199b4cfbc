//! In-process broadcast bus with identity-filtered subscriptions.

use crate::error::PublishError;
use crate::event::{DomainEvent, Topic};
use crate::publisher::EventPublisher;
use async_trait::async_trait;
use pagewatch_core::UserId;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Lightweight in-process event bus that fans out scan notifications to
/// subscribers inside the service.
pub struct InProcEventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl InProcEventBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to one topic, seeing only events that belong to `context`.
    #[must_use]
    pub fn subscribe(&self, topic: Topic, context: SubscriberContext) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            topic,
            context,
        }
    }

    /// Raw receiver over every event on every topic.
    #[must_use]
    pub fn subscribe_all(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl EventPublisher for InProcEventBus {
    async fn publish(&self, event: DomainEvent) -> Result<(), PublishError> {
        // No subscribers is not a failure
        let _ = self.sender.send(event);
        Ok(())
    }
}

/// Who a subscription is for.
///
/// An event is delivered when its user id equals the authenticated identity
/// or the user id the subscriber explicitly asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscriberContext {
    /// Authenticated identity of the subscriber
    pub user_id: Option<UserId>,
    /// User id passed as a subscription argument
    pub requested_user_id: Option<UserId>,
}

impl SubscriberContext {
    /// Context for an authenticated subscriber.
    #[must_use]
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            requested_user_id: None,
        }
    }

    /// True when `event` belongs to this subscriber.
    #[must_use]
    pub fn accepts(&self, event: &DomainEvent) -> bool {
        match event.user_id {
            Some(owner) => self.user_id == Some(owner) || self.requested_user_id == Some(owner),
            None => false,
        }
    }
}

/// A filtered view over the bus for one topic and one subscriber.
pub struct Subscription {
    receiver: broadcast::Receiver<DomainEvent>,
    topic: Topic,
    context: SubscriberContext,
}

impl Subscription {
    /// Topic this subscription listens on.
    #[must_use]
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Wait for the next matching event.
    ///
    /// Returns `None` once the bus is dropped. Events missed because the
    /// subscriber lagged are skipped.
    pub async fn next(&mut self) -> Option<DomainEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if event.topic == self.topic && self.context.accepts(&event) {
                        return Some(event);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(topic = %self.topic, skipped, "subscriber lagged, events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
