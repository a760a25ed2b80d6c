//! # Outcome subscribers.
//!
//! Observers plug into an [`ExecutorPool`](crate::ExecutorPool) by implementing
//! [`Subscribe`]. The pool drains its [`Bus`](crate::Bus) and hands every
//! [`Outcome`](crate::Outcome) to a [`SubscriberSet`], which gives each subscriber
//! its own bounded queue and worker.
//!
//! ## Architecture
//! ```text
//!   Executor ── publish(Outcome) ──► Bus ──► pool listener ──► SubscriberSet::emit
//!                                                                   │
//!                                                     ┌─────────────┼─────────────┐
//!                                                     ▼             ▼             ▼
//!                                                 LogWriter      Metrics       Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use tickvisor::{Outcome, Subscribe};
//! use async_trait::async_trait;
//!
//! struct FailureCounter;
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_outcome(&self, outcome: &Outcome) {
//!         if !outcome.success {
//!             // increment failure counter
//!         }
//!     }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscribe;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;

pub(crate) use subscriber_set::panic_message;
