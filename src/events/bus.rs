//! # Named broadcast point for outcome records.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`]. Executors publish
//! one [`Outcome`] per iteration; zero or more observers subscribe.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                   Receivers (zero or more):
//!   Executor 1 ──┐                      ┌──► pool listener ──► SubscriberSet
//!   Executor 2 ──┼──────► Bus ──────────┤
//!   Executor N ──┘  (broadcast chan)    └──► caller's own Receiver
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks and never fails.
//! - **No buffering for absent observers**: with no receivers, records are discarded.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **Explicit handle**: there is no global bus; clone the handle into every executor
//!   that should share it.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::outcome::Outcome;

/// Channel name used when none is given.
pub const DEFAULT_CHANNEL: &str = "tickvisor:executor";

/// Ring buffer size used when none is given.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Broadcast channel for outcome records.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: cheap to clone; clones publish into the same channel.
#[derive(Clone, Debug)]
pub struct Bus {
    name: Arc<str>,
    tx: broadcast::Sender<Outcome>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        Self::named(DEFAULT_CHANNEL, capacity)
    }

    /// Creates a new bus with an explicit channel name.
    pub fn named(name: impl Into<Arc<str>>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Outcome>(capacity);
        Self {
            name: name.into(),
            tx,
        }
    }

    /// Channel name, for diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Publishes a record to all current receivers.
    ///
    /// If there are no receivers the record is dropped.
    pub fn publish(&self, outcome: Outcome) {
        let _ = self.tx.send(outcome);
    }

    /// Creates a receiver that observes records sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Outcome> {
        self.tx.subscribe()
    }

    /// Number of receivers currently attached.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
