//! # Executor lifecycle phases.
//!
//! ```text
//!  Created ──start()──► Active ──dispose()──► Stopping ──loop drains──► Stopped
//!                         ▲                                                │
//!                         └───────────────────start()──────────────────────┘
//! ```
//!
//! - `start()` while `Active` or `Stopping` is a no-op.
//! - `dispose()` on an executor that has no loop (`Created`, `Stopped`) moves it to `Stopped`.

use std::fmt;

use serde::Serialize;

/// Lifecycle phase of a [`TaskExecutor`](crate::TaskExecutor).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Constructed, never started.
    Created,
    /// Loop running.
    Active,
    /// Disposal requested; loop still draining its current iteration.
    Stopping,
    /// Loop has exited. May be restarted.
    Stopped,
}

impl Phase {
    /// `true` while a loop exists (`Active` or `Stopping`).
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, Phase::Active | Phase::Stopping)
    }

    /// Lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Created => "created",
            Phase::Active => "active",
            Phase::Stopping => "stopping",
            Phase::Stopped => "stopped",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
