//! # Run a single iteration of an executor.
//!
//! Executes the unit of work once, races it against the optional timeout, publishes
//! one [`Outcome`] and then waits out the rest of the interval.
//!
//! ## Tokens
//! ```text
//! stop (per iteration, held by the executor; cancelled by dispose())
//!  └─► task = stop.child_token()      passed to the unit of work; cancelled by
//!                                     dispose() (via parent) or by the watchdog
//! watchdog (independent)              cancelled when the race is over, so the
//!                                     timeout timer never outlives the iteration
//! ```
//!
//! ## Flow
//! ```text
//! started = now
//! select! {
//!     work.run(task)            → Ok / Err / panic
//!     timeout elapsed           → task.cancel(), Err(Timeout)
//! }
//! watchdog.cancel()
//! publish Outcome (exactly once)
//! on Err: annotate → on_error   (a panicking callback is caught and logged)
//! if interval - elapsed > WAIT_GUARD: sleep(rest) or stop.cancelled()
//! ```
//!
//! ## Rules
//! - A timed-out unit of work is dropped when the timeout wins the race.
//! - A zero timeout is a real bound: only a unit of work that is ready on its first
//!   poll can beat it.
//! - Every error returned by the unit of work reaches the callback, including a
//!   `Canceled` returned after dispose(). Only the interval wait ends silently.
//! - Timeout cancels only `task`; the interval wait watches `stop`, so cadence
//!   holds after a timeout while dispose() still interrupts the wait.

use std::future::pending;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::core::config::WAIT_GUARD;
use crate::core::executor::Shared;
use crate::error::TaskError;
use crate::events::Outcome;
use crate::subscribers::panic_message;

/// Executes one iteration of `shared`'s unit of work, including the interval wait.
pub(crate) async fn run_once(shared: &Shared, stop: &CancellationToken) {
    let started = Instant::now();
    let task = stop.child_token();
    let watchdog = CancellationToken::new();

    let res = {
        let work = AssertUnwindSafe(shared.work.run(task.clone())).catch_unwind();
        tokio::select! {
            biased;
            r = work => r.unwrap_or_else(|panic| Err(TaskError::Panicked {
                info: panic_message(panic.as_ref()),
            })),
            e = timeout_watchdog(shared.timeout, &task, &watchdog) => Err(e),
        }
    };
    watchdog.cancel();
    let elapsed = started.elapsed();

    match res {
        Ok(()) => {
            tracing::trace!(task = &*shared.name, id = %shared.id, ?elapsed, "iteration ok");
            shared
                .bus
                .publish(Outcome::succeeded(shared.id, shared.name.clone(), elapsed));
        }
        Err(err) => {
            shared.bus.publish(Outcome::failed(
                shared.id,
                shared.name.clone(),
                elapsed,
                err.message(),
            ));
            if err.is_canceled() && stop.is_cancelled() {
                tracing::debug!(task = &*shared.name, id = %shared.id, "iteration aborted by dispose");
            }
            shared.report(err.annotate(shared.name.clone(), shared.id));
        }
    }

    if let Some(rest) = remaining(shared.interval, elapsed) {
        if !stop.is_cancelled() {
            tokio::select! {
                _ = time::sleep(rest) => {}
                _ = stop.cancelled() => {}
            }
        }
    }
}

/// Cancels `task` and resolves with a timeout error once `timeout` elapses.
///
/// Never resolves when `timeout` is `None` or once `watchdog` is cancelled.
async fn timeout_watchdog(
    timeout: Option<Duration>,
    task: &CancellationToken,
    watchdog: &CancellationToken,
) -> TaskError {
    let Some(dur) = timeout else {
        return pending().await;
    };
    tokio::select! {
        _ = time::sleep(dur) => {
            task.cancel();
            TaskError::Timeout { timeout: dur }
        }
        _ = watchdog.cancelled() => pending().await,
    }
}

/// Rest of the interval, if it exceeds [`WAIT_GUARD`].
#[inline]
pub(crate) fn remaining(interval: Duration, elapsed: Duration) -> Option<Duration> {
    interval
        .checked_sub(elapsed)
        .filter(|rest| *rest > WAIT_GUARD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_respects_guard() {
        let interval = Duration::from_millis(1000);
        assert_eq!(
            remaining(interval, Duration::from_millis(100)),
            Some(Duration::from_millis(900))
        );
        assert_eq!(remaining(interval, Duration::from_millis(900)), None);
        assert_eq!(remaining(interval, Duration::from_millis(899)), Some(Duration::from_millis(101)));
        assert_eq!(remaining(interval, Duration::from_millis(5000)), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_cancels_task_on_timeout() {
        let task = CancellationToken::new();
        let watchdog = CancellationToken::new();
        let err = timeout_watchdog(Some(Duration::from_millis(50)), &task, &watchdog).await;
        assert!(matches!(err, TaskError::Timeout { .. }));
        assert!(task.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_disarmed_never_fires() {
        let task = CancellationToken::new();
        let watchdog = CancellationToken::new();
        watchdog.cancel();
        let res = time::timeout(
            Duration::from_secs(5),
            timeout_watchdog(Some(Duration::from_millis(50)), &task, &watchdog),
        )
        .await;
        assert!(res.is_err());
        assert!(!task.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_timeout_never_fires() {
        let task = CancellationToken::new();
        let watchdog = CancellationToken::new();
        let res = time::timeout(
            Duration::from_secs(60),
            timeout_watchdog(None, &task, &watchdog),
        )
        .await;
        assert!(res.is_err());
        assert!(!task.is_cancelled());
    }
}
