//! # tickvisor
//!
//! **Tickvisor** runs async units of work on a fixed cadence.
//!
//! A [`TaskExecutor`] invokes one [`Work`] repeatedly, one iteration at a time, with a
//! per-iteration timeout, cooperative cancellation through
//! [`CancellationToken`](tokio_util::sync::CancellationToken), and error isolation:
//! a failing or panicking iteration never stops the loop. Every iteration publishes
//! exactly one [`Outcome`] to a [`Bus`]. An [`ExecutorPool`] groups independent
//! executors around a shared bus and fans records out to [`Subscribe`]rs.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ TaskExecutor │   │ TaskExecutor │   │ TaskExecutor │
//!     │  (poller)    │   │  (sweeper)   │   │  (fetcher)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │ one Outcome per iteration           │
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                  (capacity: PoolConfig::bus_capacity)             │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │   listener (in pool)   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                        ┌──────────┼──────────┐
//!                        ▼          ▼          ▼
//!                     worker1    worker2    workerN
//! ```
//!
//! ### Lifecycle
//! ```text
//! Created ──start()──► Active ──dispose()──► Stopping ──loop exits──► Stopped
//!    │                   ▲                                              │
//!    └──dispose()──► Stopped ◄──────────────────────────────────────────┘
//!                        └──────────────start()──────► Active
//!
//! iteration {
//!   started = now
//!   work.run(token) raced against timeout
//!   publish Outcome { success, durationMs, error? }
//!   on failure: annotate(name, id) ─► on_error
//!   wait max(0, interval - elapsed), interruptible by dispose()
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Executors**     | Recurring unit of work with timeout and cancellation.         | [`TaskExecutor`], [`ExecutorBuilder`]       |
//! | **Work**          | Define units of work as closures or trait objects.            | [`Work`], [`WorkFn`], [`WorkRef`]           |
//! | **Outcomes**      | One record per iteration on a broadcast bus.                  | [`Outcome`], [`Bus`]                        |
//! | **Subscriber API**| Hook into outcome records (logging, metrics, custom).         | [`Subscribe`], [`SubscriberSet`]            |
//! | **Pools**         | Group executors, fan out records, graceful shutdown.          | [`ExecutorPool`], [`PoolConfig`]            |
//! | **Errors**        | Typed errors for configuration, iterations and the pool.      | [`ConfigError`], [`TaskError`], [`RuntimeError`] |
//! | **Configuration** | Validate untyped (JSON) executor settings.                    | [`ExecutorSettings`]                        |
//!
//! ## Optional features
//! - `logging` (default): exports a simple built-in [`LogWriter`] subscriber.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use tickvisor::{TaskError, TaskExecutor};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let exec = TaskExecutor::builder("hello")
//!         .interval(Duration::from_millis(1000))
//!         .timeout(Duration::from_millis(500))
//!         .work_fn(|ctx: CancellationToken| async move {
//!             if ctx.is_cancelled() {
//!                 return Err(TaskError::Canceled);
//!             }
//!             println!("tick");
//!             Ok(())
//!         })
//!         .on_error(|err| eprintln!("iteration failed: {err}"))
//!         .build()?;
//!
//!     let mut records = exec.bus().subscribe();
//!     exec.start();
//!     let first = records.recv().await?;
//!     assert!(first.success);
//!
//!     exec.dispose();
//!     exec.stopped().await;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use crate::core::{
    Diagnostics, ErrorHandler, ExecutorBuilder, ExecutorPool, ExecutorSettings, MIN_INTERVAL,
    Phase, PoolBuilder, PoolConfig, TaskExecutor, WAIT_GUARD, wait_for_shutdown_signal,
};
pub use error::{ConfigError, RuntimeError, TaskError};
pub use events::{Bus, DEFAULT_CAPACITY, DEFAULT_CHANNEL, OPERATION, Outcome, OutcomeParams};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{TaskId, Work, WorkFn, WorkRef};

// Optional: expose a simple built-in logger subscriber.
// Enabled by default; disable with `default-features = false`.
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
