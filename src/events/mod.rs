//! Outcome records and the broadcast bus they travel on.
//!
//! ## Contents
//! - [`Outcome`], [`OutcomeParams`] the per-iteration record and its payload
//! - [`Bus`] named wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: every `TaskExecutor`, exactly once per iteration.
//! - **Consumers**: `ExecutorPool`'s listener (fans out to `SubscriberSet`) and any
//!   caller holding a receiver from [`Bus::subscribe`].

mod bus;
mod outcome;

pub use bus::{Bus, DEFAULT_CAPACITY, DEFAULT_CHANNEL};
pub use outcome::{OPERATION, Outcome, OutcomeParams};
