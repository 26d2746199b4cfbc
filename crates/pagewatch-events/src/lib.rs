//! Pagewatch Events - change notifications for live subscribers.
//!
//! Scan results fan out as [`DomainEvent`]s on a [`Topic`]. Publishers go
//! through the [`EventPublisher`] seam; the provided [`InProcEventBus`] is a
//! `tokio::sync::broadcast` channel with per-subscriber identity filtering.
//!
//! Delivery is at-most-once. A subscriber that falls behind the channel
//! capacity skips the events it missed.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod bus;
pub mod error;
pub mod event;
pub mod publisher;

pub use bus::{InProcEventBus, SubscriberContext, Subscription};
pub use error::PublishError;
pub use event::{DomainEvent, EventPayload, Topic};
pub use publisher::EventPublisher;
