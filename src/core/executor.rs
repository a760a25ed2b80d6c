//! # TaskExecutor: one recurring unit of work.
//!
//! Repeatedly invokes a [`Work`](crate::Work) on a timer, one iteration at a time,
//! with per-iteration timeout, cooperative cancellation and error isolation.
//!
//! ## Architecture
//! ```text
//! TaskExecutor::start() ──► tokio::spawn(run_loop)
//!
//! run_loop {
//!   while let Some(stop) = arm() {      // None once dispose() set the stopping flag
//!       run_once(stop)                  // work ∥ timeout → Outcome → on_error → interval wait
//!       disarm()                        // drop the per-iteration token
//!   }
//!   finish()                            // clear flag, phase = Stopped
//! }
//!
//! dispose() ──► stopping = true, phase = Stopping, cancel current token
//! ```
//!
//! ## Rules
//! - Iterations never overlap; iteration N (including its interval wait) finishes
//!   before N+1 starts.
//! - Each iteration gets a fresh token; between iterations there is none to cancel.
//! - Errors from the unit of work never leave the loop; they are published and handed
//!   to the error callback.
//! - A stopped executor can be started again (the loop clears the stopping flag on exit).

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use futures::FutureExt;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::core::builder::ExecutorBuilder;
use crate::core::config::{ErrorHandler, ExecutorSettings};
use crate::core::runner::run_once;
use crate::core::state::Phase;
use crate::error::{ConfigError, TaskError};
use crate::events::Bus;
use crate::subscribers::panic_message;
use crate::tasks::{TaskId, WorkRef};

/// State guarded by the control lock.
#[derive(Default)]
struct Control {
    /// Drives loop exit; distinct from the phase.
    stopping: bool,
    /// Token of the in-flight iteration.
    current: Option<CancellationToken>,
}

/// State shared between the handle and its loop.
pub(crate) struct Shared {
    pub(crate) id: TaskId,
    pub(crate) name: Arc<str>,
    pub(crate) interval: Duration,
    pub(crate) timeout: Option<Duration>,
    pub(crate) work: WorkRef,
    pub(crate) on_error: ErrorHandler,
    pub(crate) bus: Bus,
    created_on: SystemTime,
    born: Instant,
    control: Mutex<Control>,
    phase: watch::Sender<Phase>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Creates the token for the next iteration, or `None` if stopping.
    fn arm(&self) -> Option<CancellationToken> {
        let mut ctl = self.lock();
        if ctl.stopping {
            return None;
        }
        let token = CancellationToken::new();
        ctl.current = Some(token.clone());
        Some(token)
    }

    fn disarm(&self) {
        self.lock().current = None;
    }

    /// Loop exit: clears the stopping flag so the executor can be restarted.
    fn finish(&self) {
        let mut ctl = self.lock();
        ctl.stopping = false;
        ctl.current = None;
        self.phase.send_replace(Phase::Stopped);
    }

    /// Hands `err` to the error callback; a panicking callback is logged, never propagated.
    pub(crate) fn report(&self, err: TaskError) {
        let handler = AssertUnwindSafe(|| (self.on_error)(err));
        if let Err(panic) = std::panic::catch_unwind(handler) {
            tracing::error!(
                task = &*self.name,
                id = %self.id,
                info = panic_message(panic.as_ref()),
                "error callback panicked"
            );
        }
    }
}

async fn run_loop(shared: Arc<Shared>) {
    tracing::debug!(task = &*shared.name, id = %shared.id, interval = ?shared.interval, "executor loop started");

    let body = AssertUnwindSafe(async {
        while let Some(stop) = shared.arm() {
            run_once(&shared, &stop).await;
            shared.disarm();
        }
    });
    // Callback panics are caught in `report`; this only sees panics from the loop's
    // own bookkeeping (publishing, logging).
    if let Err(panic) = body.catch_unwind().await {
        let err = TaskError::Panicked {
            info: panic_message(panic.as_ref()),
        };
        shared.report(err.annotate(shared.name.clone(), shared.id));
    }

    shared.finish();
    tracing::debug!(task = &*shared.name, id = %shared.id, "executor loop stopped");
}

/// Point-in-time view of an executor, for diagnostics.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// Executor identifier.
    pub id: TaskId,
    /// Executor name.
    pub name: Arc<str>,
    /// Current phase.
    pub state: Phase,
    /// Construction time.
    pub created_on: SystemTime,
    /// Time since construction.
    pub uptime: Duration,
    /// Effective interval.
    pub interval: Duration,
    /// Effective timeout (`None` = unbounded).
    pub timeout: Option<Duration>,
}

/// Runs one unit of work repeatedly until disposed.
///
/// Dropping the handle disposes the executor.
///
/// ## Example
/// ```no_run
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use tickvisor::{TaskError, TaskExecutor};
///
/// # async fn demo() -> Result<(), tickvisor::ConfigError> {
/// let exec = TaskExecutor::builder("poller")
///     .interval(Duration::from_secs(5))
///     .timeout(Duration::from_secs(2))
///     .work_fn(|ctx: CancellationToken| async move {
///         if ctx.is_cancelled() {
///             return Err(TaskError::Canceled);
///         }
///         // poll the queue...
///         Ok(())
///     })
///     .build()?;
///
/// exec.start();
/// tokio::time::sleep(Duration::from_secs(30)).await;
/// exec.dispose();
/// exec.stopped().await;
/// # Ok(())
/// # }
/// ```
pub struct TaskExecutor {
    shared: Arc<Shared>,
}

impl TaskExecutor {
    /// Starts describing an executor called `name`.
    pub fn builder(name: impl Into<String>) -> ExecutorBuilder {
        ExecutorBuilder::new(name)
    }

    /// Builds an executor from validated untyped settings.
    pub fn from_settings(settings: ExecutorSettings, work: WorkRef) -> Result<Self, ConfigError> {
        ExecutorBuilder::from_settings(settings).work(work).build()
    }

    pub(crate) fn from_parts(
        name: Arc<str>,
        interval: Duration,
        timeout: Option<Duration>,
        work: WorkRef,
        on_error: ErrorHandler,
        bus: Bus,
    ) -> Self {
        let (phase, _rx) = watch::channel(Phase::Created);
        let shared = Shared {
            id: TaskId::new(),
            name,
            interval,
            timeout,
            work,
            on_error,
            bus,
            created_on: SystemTime::now(),
            born: Instant::now(),
            control: Mutex::new(Control::default()),
            phase,
        };
        Self {
            shared: Arc::new(shared),
        }
    }

    /// Starts the loop in the background and returns immediately.
    ///
    /// No-op while `Active` or `Stopping`. From `Created` or `Stopped` the phase becomes
    /// `Active` and a new loop is spawned on the current Tokio runtime. Without a
    /// runtime the failure is handed to the error callback and the phase is left
    /// unchanged.
    pub fn start(&self) {
        let mut ctl = self.shared.lock();
        let before = self.shared.phase();
        if before.is_running() {
            tracing::debug!(task = &*self.shared.name, id = %self.shared.id, phase = %before, "start ignored");
            return;
        }

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(h) => h,
            Err(e) => {
                drop(ctl);
                self.shared.report(
                    TaskError::fail(format!("cannot start without a tokio runtime: {e}"))
                        .annotate(self.shared.name.clone(), self.shared.id),
                );
                return;
            }
        };

        ctl.stopping = false;
        self.shared.phase.send_replace(Phase::Active);
        drop(ctl);

        handle.spawn(run_loop(Arc::clone(&self.shared)));
    }

    /// Requests the loop to stop and returns immediately.
    ///
    /// Sets the stopping flag, moves `Active` to `Stopping` and cancels the in-flight
    /// iteration's token (aborting the unit of work and any interval wait). The loop
    /// then moves to `Stopped` on its own. Without a running loop the executor goes
    /// straight to `Stopped`. Idempotent.
    pub fn dispose(&self) {
        let mut ctl = self.shared.lock();
        match self.shared.phase() {
            Phase::Active => {
                ctl.stopping = true;
                self.shared.phase.send_replace(Phase::Stopping);
            }
            Phase::Stopping => {}
            Phase::Created | Phase::Stopped => {
                self.shared.phase.send_replace(Phase::Stopped);
            }
        }
        if let Some(token) = ctl.current.as_ref() {
            token.cancel();
        }
    }

    /// Alias of [`dispose`](Self::dispose).
    #[deprecated(note = "use `dispose`")]
    pub fn stop(&self) {
        self.dispose()
    }

    /// Waits until no loop is running (`Created` or `Stopped`).
    pub async fn stopped(&self) {
        let mut rx = self.shared.phase.subscribe();
        let _ = rx.wait_for(|p| !p.is_running()).await;
    }

    /// Receiver that observes every phase change.
    pub fn watch_state(&self) -> watch::Receiver<Phase> {
        self.shared.phase.subscribe()
    }

    /// Globally unique identifier.
    pub fn id(&self) -> TaskId {
        self.shared.id
    }

    /// Human-readable name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Current phase.
    pub fn state(&self) -> Phase {
        self.shared.phase()
    }

    /// Construction time.
    pub fn created_on(&self) -> SystemTime {
        self.shared.created_on
    }

    /// Time since construction.
    pub fn uptime(&self) -> Duration {
        self.shared.born.elapsed()
    }

    /// Effective interval (never below [`MIN_INTERVAL`](crate::MIN_INTERVAL)).
    pub fn interval(&self) -> Duration {
        self.shared.interval
    }

    /// Effective timeout; `None` means unbounded.
    pub fn timeout(&self) -> Option<Duration> {
        self.shared.timeout
    }

    /// Bus this executor publishes outcome records to.
    pub fn bus(&self) -> &Bus {
        &self.shared.bus
    }

    /// Snapshot for logs and status endpoints.
    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            id: self.id(),
            name: self.shared.name.clone(),
            state: self.state(),
            created_on: self.created_on(),
            uptime: self.uptime(),
            interval: self.interval(),
            timeout: self.timeout(),
        }
    }
}

impl Drop for TaskExecutor {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for TaskExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskExecutor")
            .field("id", &self.shared.id)
            .field("name", &self.shared.name)
            .field("state", &self.state())
            .field("interval", &self.shared.interval)
            .field("timeout", &self.shared.timeout)
            .finish()
    }
}
