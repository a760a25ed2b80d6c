//! # LogWriter: outcome records as `tracing` events
//!
//! A minimal subscriber that logs each [`Outcome`]. Successful iterations are
//! logged at `debug`, failures at `warn`.
//!
//! ## Example output (with `tracing-subscriber` fmt)
//! ```text
//! DEBUG tickvisor: [ok] task="poller" id=5c1e… duration_ms=0.4
//! WARN  tickvisor: [failed] task="poller" id=5c1e… duration_ms=200.1 error="timed out after 200ms"
//! ```

use async_trait::async_trait;

use crate::events::Outcome;
use crate::subscribers::Subscribe;

/// Outcome logging subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_outcome(&self, o: &Outcome) {
        let task = &*o.params.name;
        if o.success {
            tracing::debug!(task, id = %o.params.id, duration_ms = o.duration_ms, seq = o.seq, "[ok]");
        } else {
            tracing::warn!(
                task,
                id = %o.params.id,
                duration_ms = o.duration_ms,
                seq = o.seq,
                error = o.error.as_deref().unwrap_or("unknown"),
                "[failed]"
            );
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskId;
    use std::time::Duration;

    #[tokio::test]
    async fn test_handles_both_outcomes() {
        let w = LogWriter::new();
        w.on_outcome(&Outcome::succeeded(TaskId::new(), "t", Duration::ZERO))
            .await;
        w.on_outcome(&Outcome::failed(TaskId::new(), "t", Duration::ZERO, "boom"))
            .await;
        assert_eq!(w.name(), "LogWriter");
    }
}
