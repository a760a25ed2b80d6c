use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::config::{ErrorHandler, ExecutorSettings, default_error_handler, effective_interval};
use super::executor::TaskExecutor;
use crate::error::{ConfigError, TaskError};
use crate::events::Bus;
use crate::tasks::{WorkFn, WorkRef};

/// Builder for a [`TaskExecutor`].
///
/// Only the name and a unit of work are required. Everything is validated in
/// [`build`](Self::build); nothing is spawned until [`TaskExecutor::start`].
#[must_use]
pub struct ExecutorBuilder {
    name: String,
    work: Option<WorkRef>,
    interval: Option<Duration>,
    timeout: Option<Duration>,
    on_error: Option<ErrorHandler>,
    bus: Option<Bus>,
}

impl ExecutorBuilder {
    /// Creates a new builder for an executor called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            work: None,
            interval: None,
            timeout: None,
            on_error: None,
            bus: None,
        }
    }

    /// Seeds name, interval and timeout from validated settings.
    pub fn from_settings(settings: ExecutorSettings) -> Self {
        let mut b = Self::new(settings.name.clone());
        b.interval = settings.interval();
        b.timeout = settings.timeout();
        b
    }

    /// Sets the unit of work.
    pub fn work(mut self, work: WorkRef) -> Self {
        self.work = Some(work);
        self
    }

    /// Sets the unit of work from a closure.
    pub fn work_fn<F, Fut>(self, f: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.work(WorkFn::arc(f))
    }

    /// Requested interval; values below [`MIN_INTERVAL`](crate::MIN_INTERVAL) are clamped up.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Per-iteration timeout. Unset means unbounded; `Duration::ZERO` times out at once.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Error callback. Defaults to logging via `tracing`.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(TaskError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Bus to publish outcome records to. Defaults to a private bus.
    pub fn bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Validates and builds the executor in the `Created` phase.
    ///
    /// ### Errors
    /// - [`ConfigError::InvalidName`] if the name is empty
    /// - [`ConfigError::MissingWork`] if no unit of work was set
    pub fn build(self) -> Result<TaskExecutor, ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::InvalidName);
        }
        let work = self.work.ok_or(ConfigError::MissingWork)?;

        Ok(TaskExecutor::from_parts(
            self.name.into(),
            effective_interval(self.interval),
            self.timeout,
            work,
            self.on_error.unwrap_or_else(default_error_handler),
            self.bus.unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::MIN_INTERVAL;

    fn noop() -> WorkRef {
        WorkFn::arc(|_ctx: CancellationToken| async { Ok::<(), TaskError>(()) })
    }

    #[test]
    fn test_requires_name_and_work() {
        assert_eq!(
            ExecutorBuilder::new("").work(noop()).build().unwrap_err(),
            ConfigError::InvalidName
        );
        assert_eq!(
            ExecutorBuilder::new("x").build().unwrap_err(),
            ConfigError::MissingWork
        );
    }

    #[test]
    fn test_effective_values() {
        let exec = ExecutorBuilder::new("x")
            .work(noop())
            .interval(Duration::from_millis(10))
            .timeout(Duration::ZERO)
            .build()
            .unwrap();
        assert_eq!(exec.interval(), MIN_INTERVAL);
        assert_eq!(exec.timeout(), Some(Duration::ZERO));

        let exec = ExecutorBuilder::new("unbounded").work(noop()).build().unwrap();
        assert_eq!(exec.timeout(), None);

        let exec = ExecutorBuilder::new("y")
            .work(noop())
            .interval(Duration::from_millis(1500))
            .timeout(Duration::from_millis(300))
            .build()
            .unwrap();
        assert_eq!(exec.interval(), Duration::from_millis(1500));
        assert_eq!(exec.timeout(), Some(Duration::from_millis(300)));
    }

    #[test]
    fn test_from_settings() {
        let settings = ExecutorSettings {
            name: "from-json".into(),
            interval: Some(2000),
            timeout: Some(0),
        };
        let exec = TaskExecutor::from_settings(settings, noop()).unwrap();
        assert_eq!(exec.name(), "from-json");
        assert_eq!(exec.interval(), Duration::from_secs(2));
        assert_eq!(exec.timeout(), Some(Duration::ZERO));
    }

    #[test]
    fn test_shared_bus_is_used() {
        let bus = Bus::named("shared", 16);
        let exec = ExecutorBuilder::new("x").work(noop()).bus(bus).build().unwrap();
        assert_eq!(exec.bus().name(), "shared");
    }

    #[test]
    fn test_ids_differ_per_executor() {
        let a = ExecutorBuilder::new("same").work(noop()).build().unwrap();
        let b = ExecutorBuilder::new("same").work(noop()).build().unwrap();
        assert_ne!(a.id(), b.id());
    }
}
