//! # Per-iteration outcome record.
//!
//! Every iteration of a [`TaskExecutor`](crate::TaskExecutor) publishes exactly one
//! [`Outcome`], whether the unit of work succeeded, failed, timed out or was aborted.
//!
//! ## Wire shape
//! ```json
//! { "operation": "fetch",
//!   "params": { "id": "…uuid…", "name": "worker-x" },
//!   "durationMs": 12.5,
//!   "success": false,
//!   "error": "boom" }
//! ```
//! `error` is omitted on success. `seq` and `at` are carried in memory only.
//!
//! ## Ordering
//! `seq` is a process-wide monotonic counter; use it to restore publish order when
//! records from several executors interleave.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use serde::Serialize;

use crate::tasks::TaskId;

/// Operation tag carried by every record.
pub const OPERATION: &str = "fetch";

/// Global sequence counter for record ordering.
static OUTCOME_SEQ: AtomicU64 = AtomicU64::new(0);

/// Identity of the executor that produced a record.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct OutcomeParams {
    /// Executor identifier.
    pub id: TaskId,
    /// Executor name.
    pub name: Arc<str>,
}

/// Structured result of one iteration.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    /// Constant operation tag ([`OPERATION`]).
    pub operation: &'static str,
    /// Executor identity.
    pub params: OutcomeParams,
    /// Wall time of the unit of work, in milliseconds (fractional).
    pub duration_ms: f64,
    /// Whether the unit of work completed without error.
    pub success: bool,
    /// Failure message; present only when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Globally unique, monotonically increasing sequence number.
    #[serde(skip)]
    pub seq: u64,
    /// Wall-clock timestamp of publication.
    #[serde(skip)]
    pub at: SystemTime,
}

impl Outcome {
    /// Creates a record; `error = None` means success.
    pub fn new(
        id: TaskId,
        name: impl Into<Arc<str>>,
        duration: Duration,
        error: Option<String>,
    ) -> Self {
        Self {
            seq: OUTCOME_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            operation: OPERATION,
            params: OutcomeParams {
                id,
                name: name.into(),
            },
            duration_ms: duration.as_secs_f64() * 1000.0,
            success: error.is_none(),
            error,
        }
    }

    /// Successful record.
    #[inline]
    pub fn succeeded(id: TaskId, name: impl Into<Arc<str>>, duration: Duration) -> Self {
        Self::new(id, name, duration, None)
    }

    /// Failed record carrying `error`.
    #[inline]
    pub fn failed(
        id: TaskId,
        name: impl Into<Arc<str>>,
        duration: Duration,
        error: impl Into<String>,
    ) -> Self {
        Self::new(id, name, duration, Some(error.into()))
    }

    /// JSON form of the record.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_wire_shape_omits_error() {
        let id = TaskId::new();
        let rec = Outcome::succeeded(id, "poller", Duration::from_micros(1500));
        assert_eq!(
            rec.to_json(),
            json!({
                "operation": "fetch",
                "params": { "id": id.to_string(), "name": "poller" },
                "durationMs": 1.5,
                "success": true,
            })
        );
    }

    #[test]
    fn test_failure_wire_shape_has_error() {
        let rec = Outcome::failed(TaskId::new(), "poller", Duration::ZERO, "boom");
        let v = rec.to_json();
        assert_eq!(v["success"], json!(false));
        assert_eq!(v["error"], json!("boom"));
        assert_eq!(v["durationMs"], json!(0.0));
        assert!(v.get("seq").is_none());
    }

    #[test]
    fn test_seq_is_monotonic() {
        let a = Outcome::succeeded(TaskId::new(), "a", Duration::ZERO);
        let b = Outcome::succeeded(TaskId::new(), "b", Duration::ZERO);
        assert!(b.seq > a.seq);
    }
}
