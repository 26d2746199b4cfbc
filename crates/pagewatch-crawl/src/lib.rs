//! Pagewatch Crawl - site-wide crawl intake.
//!
//! A crawl arrives as a [`CrawlJob`] together with a [`CrawlStream`] the
//! per-page results are written to. The [`TrackingRegistry`] keeps at most
//! one active stream per `(user, domain)`: registering a new one cancels and
//! closes the old one. The [`CrawlQueue`] drains jobs with a concurrency
//! limit shared by every job.
//!
//! # Example
//!
//! ```ignore
//! use pagewatch_crawl::{ChannelSink, CrawlJob, CrawlService, CrawlStream};
//! use std::sync::Arc;
//!
//! let service = CrawlService::new(handler, &config.scanning);
//! let (sink, mut updates) = ChannelSink::new(16);
//! let stream = Arc::new(CrawlStream::new(sink));
//! service.submit_crawl(stream, job).await?;
//!
//! while let Some(update) = updates.recv().await {
//!     println!("{} -> {}", update.page_url, update.code);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod error;
pub mod job;
pub mod queue;
pub mod registry;
pub mod stream;

pub use error::{CrawlError, Result};
pub use job::{CrawlJob, CrawlUpdate, TrackingKey};
pub use queue::{CrawlQueue, CrawlService, PageScanner};
pub use registry::{Ticket, TrackingRegistry};
pub use stream::{ChannelSink, CrawlSink, CrawlStream};
