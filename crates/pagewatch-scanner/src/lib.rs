//! Pagewatch Scanner - single-page scan orchestration.
//!
//! Takes a scan request through target normalization, the remote audit call,
//! result extraction, issue limiting and multi-record persistence, and fans
//! out change events along the way.
//!
//! # Features
//!
//! - Tier gating of the insights report and script storage
//! - Preview truncation of issue lists for unprivileged callers
//! - Concurrent best-effort upserts of every record derived from one audit
//! - Fixed-window admission control per caller
//!
//! # Example
//!
//! ```rust,ignore
//! use pagewatch_scanner::ScanHandler;
//! use std::sync::Arc;
//!
//! let handler = ScanHandler::new(
//!     Arc::new(audit_client),
//!     Arc::new(database),
//!     Arc::new(event_bus),
//!     &config,
//! );
//!
//! let result = handler.scan_simple("https://example.com", Some(user_id), false).await;
//! println!("{} {}", result.code, result.message);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod admission;
#[allow(missing_docs)]
pub mod error;
#[allow(missing_docs)]
pub mod extract;
pub mod handler;
#[allow(missing_docs)]
pub mod limit;
#[allow(missing_docs)]
pub mod notify;
pub mod persist;
#[allow(missing_docs)]
pub mod result;

pub use admission::{
    AdmissionControl, CallerKey, CounterStore, EndpointClass, MemoryCounterStore, WindowCount,
};
pub use error::{Result, ScanError};
pub use extract::{extract, ExtractedAudit};
pub use handler::ScanHandler;
pub use limit::{IssueLimiter, LimitedIssues, DEFAULT_PREVIEW_CAP};
pub use notify::{IssueNotifier, LogNotifier, NotifyError};
pub use persist::{CommitOutcome, EntityKind, PersistOptions, PersistenceCoordinator};
pub use result::{ScanData, ScanResult};
