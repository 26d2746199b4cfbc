//! Active crawl stream tracking.

use crate::job::TrackingKey;
use crate::stream::CrawlStream;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// Identifies one registration of a stream.
pub type Ticket = Uuid;

/// Keeps at most one active crawl stream per [`TrackingKey`].
#[derive(Default)]
pub struct TrackingRegistry {
    entries: Mutex<HashMap<TrackingKey, (Ticket, Arc<CrawlStream>)>>,
}

impl TrackingRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `stream` for `key`, superseding any stream already there.
    ///
    /// The previous stream is cancelled and closed before this returns.
    pub async fn register(&self, key: TrackingKey, stream: Arc<CrawlStream>) -> Ticket {
        let ticket = Uuid::new_v4();
        let previous = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), (ticket, stream));

        if let Some((old_ticket, old_stream)) = previous {
            tracing::warn!(%key, %old_ticket, "superseding active crawl");
            old_stream.close().await;
        }

        ticket
    }

    /// Remove the entry for `key` if it still belongs to `ticket`.
    ///
    /// Returns false when a newer registration has taken the key.
    pub fn release(&self, key: &TrackingKey, ticket: Ticket) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some((current, _)) if *current == ticket => {
                entries.remove(key);
                true
            }
            _ => false,
        }
    }

    /// True when a stream is registered for `key`.
    #[must_use]
    pub fn is_active(&self, key: &TrackingKey) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Number of active streams.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
