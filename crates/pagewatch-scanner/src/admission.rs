//! Admission control for scan entry points.
//!
//! Fixed-window counters keyed by caller identity and endpoint class. The
//! counters live behind [`CounterStore`] so several service instances can
//! share them; [`MemoryCounterStore`] keeps them in process.

use crate::error::{Result, ScanError};
use async_trait::async_trait;
use pagewatch_core::{LimitsConfig, UserId};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Who is calling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallerKey {
    /// Unauthenticated caller, identified by address
    Ip(IpAddr),
    /// Authenticated caller
    User(UserId),
}

impl CallerKey {
    /// Counter key for this caller within `class`.
    #[must_use]
    pub fn to_cache_key(&self, class: EndpointClass) -> String {
        match self {
            Self::Ip(ip) => format!("{}:ip:{ip}", class.as_str()),
            Self::User(id) => format!("{}:user:{id}", class.as_str()),
        }
    }
}

/// Endpoint budget a call is charged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointClass {
    /// General API calls
    Api,
    /// Calls that trigger an audit
    Scan,
}

impl EndpointClass {
    /// Short name used in counter keys.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Scan => "scan",
        }
    }
}

/// Counter state after an increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCount {
    /// Calls counted in the current window, including this one
    pub count: u32,
    /// Time until the window resets
    pub resets_in: Duration,
}

/// Shared fixed-window counters.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Count one call for `key`, opening a new window when the last one expired.
    async fn increment(&self, key: &str, window: Duration) -> Result<WindowCount>;
}

#[derive(Debug, Clone, Copy)]
struct OpenWindow {
    started: Instant,
    length: Duration,
    count: u32,
}

impl OpenWindow {
    fn is_open(&self, now: Instant) -> bool {
        now.duration_since(self.started) < self.length
    }
}

/// In-process [`CounterStore`].
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    windows: Mutex<HashMap<String, OpenWindow>>,
}

impl MemoryCounterStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment(&self, key: &str, window: Duration) -> Result<WindowCount> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        // Each entry expires by its own length; classes share this map
        windows.retain(|_, open| open.is_open(now));

        let entry = windows.entry(key.to_string()).or_insert(OpenWindow {
            started: now,
            length: window,
            count: 0,
        });
        entry.count = entry.count.saturating_add(1);

        Ok(WindowCount {
            count: entry.count,
            resets_in: entry.length.saturating_sub(now.duration_since(entry.started)),
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Budget {
    max: u32,
    window: Duration,
}

/// Per-caller admission budgets.
pub struct AdmissionControl {
    store: Arc<dyn CounterStore>,
    api: Budget,
    scan: Budget,
}

impl AdmissionControl {
    /// Budgets from configuration over a shared counter store.
    #[must_use]
    pub fn new(store: Arc<dyn CounterStore>, limits: &LimitsConfig) -> Self {
        Self {
            store,
            api: Budget {
                max: limits.api_max,
                window: Duration::from_secs(limits.api_window_secs),
            },
            scan: Budget {
                max: limits.scan_max,
                window: Duration::from_secs(limits.scan_window_secs),
            },
        }
    }

    /// Charge one call to `caller`'s budget for `class`.
    ///
    /// # Errors
    /// Returns [`ScanError::RateLimited`] when the budget is spent.
    pub async fn check(&self, caller: &CallerKey, class: EndpointClass) -> Result<()> {
        let budget = match class {
            EndpointClass::Api => self.api,
            EndpointClass::Scan => self.scan,
        };

        let key = caller.to_cache_key(class);
        let count = self.store.increment(&key, budget.window).await?;
        if count.count > budget.max {
            tracing::warn!(%key, count = count.count, limit = budget.max, "rate limit exceeded");
            return Err(ScanError::RateLimited {
                retry_after: count.resets_in,
            });
        }

        Ok(())
    }
}
