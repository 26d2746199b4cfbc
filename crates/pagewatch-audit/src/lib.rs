//! Pagewatch Audit - contract with the remote accessibility audit engine.
//!
//! The engine renders a page, runs the accessibility runners and returns the
//! raw page state, the generated fix script and the issue list. This crate
//! only carries requests to it and classifies its failures; it never decides
//! which options a caller is entitled to.
//!
//! # Example
//!
//! ```rust,no_run
//! use pagewatch_audit::{AuditEngine, AuditRequest, HttpAuditClient};
//! use pagewatch_core::AuditConfig;
//!
//! # async fn run() -> Result<(), pagewatch_audit::AuditError> {
//! let client = HttpAuditClient::new(&AuditConfig::default())?;
//! let result = client.audit(AuditRequest::new("https://example.com")).await?;
//! if result.page.is_none() {
//!     println!("page did not render in time");
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod client;
pub mod engine;
pub mod error;

pub use client::HttpAuditClient;
pub use engine::{AuditEngine, AuditRequest, AuditResult, IssueReport, PageRecord, ScriptReport};
pub use error::{AuditError, Result};
