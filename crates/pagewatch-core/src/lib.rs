//! Pagewatch Core - Foundation crate for the Pagewatch scan pipeline.
//!
//! This crate provides shared types, persisted record shapes, error handling,
//! configuration management and target normalization that all other Pagewatch
//! crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Shared newtypes and enums (`UserId`, `Account`, `Runner`, `ScanRequest`)
//! - [`models`] - Record shapes for websites, pages, issues, scripts and analytics
//! - [`target`] - URL normalization and domain derivation
//! - [`access`] - Sanitizing of per-website access rule lists
//!
//! # Example
//!
//! ```rust
//! use pagewatch_core::{ScanRequest, ScanTarget, UserId};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let request = ScanRequest::builder("https://example.com/")
//!     .user_id(UserId::new(42))
//!     .page_insights(true)
//!     .build();
//!
//! let target = ScanTarget::parse(request.url())?;
//! assert_eq!(target.domain(), "example.com");
//! assert!(target.is_root());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod access;
pub mod config;
pub mod error;
pub mod models;
pub mod target;
pub mod types;

// Re-export commonly used types
pub use access::{sanitize_rules, sanitize_runners, MAX_RULE_ENTRIES, MAX_RULE_LENGTH, MAX_RUNNERS};
pub use config::{
    AppConfig, AuditConfig, DatabaseConfig, Environment, EventsConfig, GeneralConfig,
    LimitsConfig, ScanningConfig,
};
pub use error::{ConfigError, ConfigResult, PagewatchError, Result};
pub use models::{
    AnalyticsRecord, InsightBlob, Issue, IssueSet, IssueType, IssuesInfo, Page, PageHeader,
    PageLoadTime, PageSnapshot, ScriptMeta, ScriptRecord, Website,
};
pub use target::ScanTarget;
pub use types::{Account, PageIdentity, Runner, ScanRequest, ScanRequestBuilder, UserId};
