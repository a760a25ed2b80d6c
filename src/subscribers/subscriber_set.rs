//! # Non-blocking fan-out to multiple subscribers.
//!
//! ## Architecture
//! ```text
//! emit(outcome)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_outcome()
//!     │    (bounded)         └──────► panic → logged, worker continues
//!     ├──► [queue 2] ──► worker 2 ──► subscriber2.on_outcome()
//!     └──► [queue N] ──► worker N ──► subscriberN.on_outcome()
//! ```
//!
//! ## Rules
//! - **No cross-subscriber ordering**: subscriber A may process record N while B processes N+5
//! - **Overflow**: record dropped for that subscriber only, logged at `warn`
//! - **Non-blocking**: `emit()` returns immediately (uses `try_send`)
//! - **Isolation**: a slow or panicking subscriber doesn't affect others
//! - **Per-subscriber FIFO**: each subscriber sees records in order
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a subscriber panics while holding a lock.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::Outcome;
use crate::subscribers::Subscribe;

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Outcome>>,
}

/// Fan-out coordinator for multiple subscribers.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker task per subscriber.
    ///
    /// Must be called inside a Tokio runtime. Minimum queue capacity is 1.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let cap = sub.queue_capacity().max(1);
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Outcome>>(cap);
            let s = Arc::clone(&sub);

            let handle = tokio::spawn(async move {
                while let Some(rec) = rx.recv().await {
                    let fut = s.on_outcome(rec.as_ref());
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await
                    {
                        let info = panic_message(panic_err.as_ref());
                        tracing::error!(subscriber = s.name(), %info, "subscriber panicked");
                    }
                }
            });
            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }
        Self { channels, workers }
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// `true` when no subscriber is registered.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Emits a record to all subscribers (clones it once into an `Arc`).
    pub fn emit(&self, outcome: &Outcome) {
        self.emit_arc(Arc::new(outcome.clone()));
    }

    /// Emits a pre-allocated `Arc<Outcome>` to all subscribers.
    pub fn emit_arc(&self, outcome: Arc<Outcome>) {
        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&outcome)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(subscriber = channel.name, seq = outcome.seq, "subscriber queue full; record dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::warn!(subscriber = channel.name, seq = outcome.seq, "subscriber worker closed; record dropped");
                }
            }
        }
    }

    /// Closes all queues and waits for workers to drain them.
    pub async fn shutdown(self) {
        drop(self.channels);

        for h in self.workers {
            let _ = h.await;
        }
    }
}

pub(crate) fn panic_message(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
