//! # ExecutorPool: independent executors sharing one bus.
//!
//! The pool owns a [`Bus`], an optional [`SubscriberSet`] fed from it, and any number
//! of [`TaskExecutor`]s. Executors share nothing but the bus; each keeps its own
//! lifecycle and cancellation tokens.
//!
//! ## Architecture
//! ```text
//!   Executor A ──┐
//!   Executor B ──┼── publish(Outcome) ──► Bus ──► listener ──► SubscriberSet::emit
//!   Executor N ──┘                                             ┌──────┼──────┐
//!                                                              ▼      ▼      ▼
//!                                                            sub1   sub2   subN
//!
//! Shutdown path:
//!   dispose_all() ──► wait every executor's stopped() up to cfg.grace
//!                       ├─ all stopped  → Ok(())
//!                       └─ timeout      → RuntimeError::GraceExceeded { stuck }
//!                 ──► listener drains the bus, subscriber workers drain their queues
//! ```
//!
//! ## Example
//! ```no_run
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use tickvisor::{ExecutorPool, PoolConfig, TaskError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut pool = ExecutorPool::builder(PoolConfig::default()).build();
//!
//!     for queue in ["emails", "invoices"] {
//!         let exec = pool
//!             .builder_for(queue)
//!             .interval(Duration::from_secs(2))
//!             .work_fn(|_ctx: CancellationToken| async { Ok::<(), TaskError>(()) })
//!             .build()?;
//!         pool.add(exec);
//!     }
//!
//!     pool.run_until_signal().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use super::builder::ExecutorBuilder;
use super::config::PoolConfig;
use super::executor::TaskExecutor;
use super::shutdown;
use crate::error::RuntimeError;
use crate::events::{Bus, Outcome};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::tasks::TaskId;

/// Builder for an [`ExecutorPool`].
#[must_use]
pub struct PoolBuilder {
    cfg: PoolConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    channel: Option<String>,
}

impl PoolBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: PoolConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            channel: None,
        }
    }

    /// Sets outcome subscribers.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Names the pool's bus (defaults to [`DEFAULT_CHANNEL`](crate::DEFAULT_CHANNEL)).
    pub fn with_channel(mut self, name: impl Into<String>) -> Self {
        self.channel = Some(name.into());
        self
    }

    /// Builds the pool.
    ///
    /// With subscribers configured, their workers and the bus listener are spawned,
    /// so this must then be called inside a Tokio runtime.
    pub fn build(self) -> ExecutorPool {
        let capacity = self.cfg.bus_capacity_clamped();
        let bus = match self.channel {
            Some(name) => Bus::named(name, capacity),
            None => Bus::new(capacity),
        };

        let fanout = if self.subscribers.is_empty() {
            None
        } else {
            let set = Arc::new(SubscriberSet::new(self.subscribers));
            let closing = CancellationToken::new();
            let listener = tokio::spawn(listen(bus.subscribe(), Arc::clone(&set), closing.clone()));
            Some(Fanout {
                set,
                closing,
                listener,
            })
        };

        ExecutorPool {
            cfg: self.cfg,
            bus,
            fanout,
            executors: Vec::new(),
        }
    }
}

/// Subscriber delivery wiring.
struct Fanout {
    set: Arc<SubscriberSet>,
    closing: CancellationToken,
    listener: JoinHandle<()>,
}

/// Forwards bus records to the subscriber set until closed, then drains what is buffered.
async fn listen(
    mut rx: broadcast::Receiver<Outcome>,
    set: Arc<SubscriberSet>,
    closing: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            msg = rx.recv() => match msg {
                Ok(rec) => set.emit(&rec),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "outcome listener lagged");
                }
                Err(RecvError::Closed) => break,
            },
            _ = closing.cancelled() => {
                while let Ok(rec) = rx.try_recv() {
                    set.emit(&rec);
                }
                break;
            }
        }
    }
}

/// A set of independent executors sharing one bus.
pub struct ExecutorPool {
    cfg: PoolConfig,
    bus: Bus,
    fanout: Option<Fanout>,
    executors: Vec<TaskExecutor>,
}

impl ExecutorPool {
    /// Starts building a pool.
    pub fn builder(cfg: PoolConfig) -> PoolBuilder {
        PoolBuilder::new(cfg)
    }

    /// Pool without subscribers.
    pub fn new(cfg: PoolConfig) -> Self {
        PoolBuilder::new(cfg).build()
    }

    /// The pool's bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Pool configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.cfg
    }

    /// Executor builder already wired to the pool's bus.
    pub fn builder_for(&self, name: impl Into<String>) -> ExecutorBuilder {
        ExecutorBuilder::new(name).bus(self.bus.clone())
    }

    /// Adds an executor and returns its id. Its phase is left as is.
    pub fn add(&mut self, executor: TaskExecutor) -> TaskId {
        let id = executor.id();
        tracing::debug!(task = executor.name(), %id, "executor added to pool");
        self.executors.push(executor);
        id
    }

    /// Removes an executor from the pool and hands it back (dropping it disposes it).
    pub fn remove(&mut self, id: TaskId) -> Option<TaskExecutor> {
        let idx = self.executors.iter().position(|e| e.id() == id)?;
        Some(self.executors.swap_remove(idx))
    }

    /// Looks up an executor by id.
    pub fn get(&self, id: TaskId) -> Option<&TaskExecutor> {
        self.executors.iter().find(|e| e.id() == id)
    }

    /// Iterates over the pool's executors.
    pub fn iter(&self) -> impl Iterator<Item = &TaskExecutor> {
        self.executors.iter()
    }

    /// Sorted executor names (names need not be unique).
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.executors.iter().map(|e| e.name().to_string()).collect();
        names.sort_unstable();
        names
    }

    /// Number of executors.
    pub fn len(&self) -> usize {
        self.executors.len()
    }

    /// `true` when the pool holds no executor.
    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }

    /// Starts every executor (no-op for those already running).
    pub fn start_all(&self) {
        for e in &self.executors {
            e.start();
        }
    }

    /// Disposes every executor without waiting.
    pub fn dispose_all(&self) {
        for e in &self.executors {
            e.dispose();
        }
    }

    /// Disposes all executors, waits up to `grace` for them to stop, then drains subscribers.
    ///
    /// Returns [`RuntimeError::GraceExceeded`] naming the executors still running.
    pub async fn shutdown(mut self) -> Result<(), RuntimeError> {
        self.dispose_all();

        let grace = self.cfg.grace;
        let all = futures::future::join_all(self.executors.iter().map(TaskExecutor::stopped));
        let res = match time::timeout(grace, all).await {
            Ok(_) => {
                tracing::info!(count = self.executors.len(), "all executors stopped within grace");
                Ok(())
            }
            Err(_) => {
                let stuck: Vec<String> = self
                    .executors
                    .iter()
                    .filter(|e| e.state().is_running())
                    .map(|e| e.name().to_string())
                    .collect();
                tracing::warn!(?grace, ?stuck, "grace exceeded");
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        };

        if let Some(fanout) = self.fanout.take() {
            fanout.closing.cancel();
            let _ = fanout.listener.await;
            if let Ok(set) = Arc::try_unwrap(fanout.set) {
                set.shutdown().await;
            }
        }
        res
    }

    /// Starts all executors, waits for a termination signal, then [`shutdown`](Self::shutdown)s.
    pub async fn run_until_signal(self) -> Result<(), RuntimeError> {
        self.start_all();
        shutdown::wait_for_shutdown_signal().await?;
        self.shutdown().await
    }
}

impl Drop for ExecutorPool {
    fn drop(&mut self) {
        if let Some(fanout) = &self.fanout {
            fanout.closing.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::Phase;
    use crate::error::TaskError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    #[derive(Default)]
    struct Names {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Subscribe for Names {
        async fn on_outcome(&self, outcome: &Outcome) {
            self.seen.lock().unwrap().push(outcome.params.name.to_string());
        }
    }

    fn ok_exec(pool: &ExecutorPool, name: &str) -> TaskExecutor {
        pool.builder_for(name)
            .work_fn(|_ctx: CancellationToken| async { Ok::<(), TaskError>(()) })
            .build()
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_every_executor() {
        let names = Arc::new(Names::default());
        let mut pool = ExecutorPool::builder(PoolConfig::default())
            .with_subscribers(vec![names.clone() as Arc<dyn Subscribe>])
            .build();
        let a = ok_exec(&pool, "a");
        let b = ok_exec(&pool, "b");
        pool.add(a);
        pool.add(b);
        assert_eq!(pool.names(), vec!["a".to_string(), "b".to_string()]);

        pool.start_all();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        pool.shutdown().await.unwrap();

        let mut seen = names.seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, vec!["a", "a", "b", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_reports_stuck_executors() {
        let mut pool = ExecutorPool::new(PoolConfig {
            grace: Duration::from_secs(1),
            ..PoolConfig::default()
        });
        // Ignores its token and never finishes.
        let stuck = pool
            .builder_for("stubborn")
            .work_fn(|_ctx: CancellationToken| async {
                std::future::pending::<()>().await;
                Ok::<(), TaskError>(())
            })
            .build()
            .unwrap();
        let fine = ok_exec(&pool, "fine");
        let id = pool.add(stuck);
        pool.add(fine);
        pool.start_all();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(pool.get(id).map(TaskExecutor::state), Some(Phase::Active));

        match pool.shutdown().await {
            Err(RuntimeError::GraceExceeded { stuck, .. }) => assert_eq!(stuck, vec!["stubborn"]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_hands_back_executor() {
        let mut pool = ExecutorPool::new(PoolConfig::default());
        let exec = ok_exec(&pool, "x");
        let id = pool.add(exec);
        assert_eq!(pool.len(), 1);
        let exec = pool.remove(id).unwrap();
        assert!(pool.is_empty());
        assert!(pool.remove(id).is_none());
        assert_eq!(exec.state(), Phase::Created);
    }

    #[tokio::test(start_paused = true)]
    async fn test_executors_are_isolated() {
        let mut pool = ExecutorPool::new(PoolConfig::default());
        let (a, b) = (ok_exec(&pool, "a"), ok_exec(&pool, "b"));
        let a = pool.add(a);
        let b = pool.add(b);
        pool.start_all();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let exec_a = pool.get(a).unwrap();
        exec_a.dispose();
        exec_a.stopped().await;
        assert_eq!(exec_a.state(), Phase::Stopped);
        assert_eq!(pool.get(b).unwrap().state(), Phase::Active);
        pool.shutdown().await.unwrap();
    }
}
