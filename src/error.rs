//! Error types used by the executor runtime and units of work.
//!
//! This module defines three error enums:
//!
//! - [`ConfigError`]: invalid executor configuration, raised at construction.
//! - [`TaskError`]: errors raised by one iteration of a unit of work.
//! - [`RuntimeError`]: errors raised by the [`ExecutorPool`](crate::ExecutorPool) itself.
//!
//! All of them provide `as_label` for logging/metrics.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::tasks::TaskId;

/// # Invalid executor configuration.
///
/// Returned by [`ExecutorBuilder::build`](crate::ExecutorBuilder::build) and
/// [`ExecutorSettings::from_value`](crate::ExecutorSettings::from_value).
/// Construction is all-or-nothing: no executor exists when one of these is returned.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration is not a record (e.g. a JSON array or number).
    #[error("invalid configuration: expected a record, got {found}")]
    NotARecord {
        /// Kind of value that was supplied instead.
        found: String,
    },

    /// `name` is missing, not a string, or empty.
    #[error("invalid configuration: name must be a non-empty string")]
    InvalidName,

    /// `interval` was supplied but is not a non-negative integer of milliseconds.
    #[error("invalid configuration: interval must be a non-negative integer (ms), got {value}")]
    InvalidInterval {
        /// The rejected value, rendered as text.
        value: String,
    },

    /// `timeout` was supplied but is not a non-negative integer of milliseconds.
    #[error("invalid configuration: timeout must be a non-negative integer (ms), got {value}")]
    InvalidTimeout {
        /// The rejected value, rendered as text.
        value: String,
    },

    /// No unit of work was supplied.
    #[error("invalid configuration: a callable unit of work is required")]
    MissingWork,

    /// An error callback was supplied through untyped input, where it cannot be callable.
    #[error("invalid configuration: onError must be a callable, not data")]
    InvalidOnError,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tickvisor::ConfigError;
    ///
    /// assert_eq!(ConfigError::MissingWork.as_label(), "config_missing_work");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::NotARecord { .. } => "config_not_a_record",
            ConfigError::InvalidName => "config_invalid_name",
            ConfigError::InvalidInterval { .. } => "config_invalid_interval",
            ConfigError::InvalidTimeout { .. } => "config_invalid_timeout",
            ConfigError::MissingWork => "config_missing_work",
            ConfigError::InvalidOnError => "config_invalid_on_error",
        }
    }
}

/// # Errors produced by one iteration of a unit of work.
///
/// Every variant except [`TaskError::Raw`] is a *recognized* error: its message is
/// captured in outcome records and it gets annotated with the executor's name and id
/// before reaching the error callback. `Raw` carries a bare, non-error payload and is
/// passed through untouched.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum TaskError {
    /// The iteration exceeded the configured timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// The unit of work failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The unit of work observed its cancellation token and gave up.
    #[error("context cancelled")]
    Canceled,

    /// The unit of work panicked.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// A non-error payload; its string form is used verbatim.
    #[error("{0}")]
    Raw(String),

    /// A recognized error rewritten with the executor it came from.
    #[error("{source} (task \"{task}\", id {id})")]
    Annotated {
        /// The original error.
        source: Box<TaskError>,
        /// Name of the executor.
        task: Arc<str>,
        /// Identifier of the executor.
        id: TaskId,
    },
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`] from anything printable.
    ///
    /// # Example
    /// ```
    /// use tickvisor::TaskError;
    ///
    /// let err = TaskError::fail("boom");
    /// assert_eq!(err.message(), "boom");
    /// ```
    pub fn fail(error: impl ToString) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Shorthand for [`TaskError::Raw`].
    pub fn raw(value: impl Into<String>) -> Self {
        TaskError::Raw(value.into())
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// Annotated errors report the label of the error they wrap.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Raw(_) => "task_raw",
            TaskError::Annotated { source, .. } => source.as_label(),
        }
    }

    /// Returns the message recorded in outcome records.
    ///
    /// For [`TaskError::Fail`] this is the bare error text; for [`TaskError::Raw`]
    /// the payload itself; otherwise the display form.
    pub fn message(&self) -> String {
        match self {
            TaskError::Fail { error } => error.clone(),
            TaskError::Raw(value) => value.clone(),
            other => other.to_string(),
        }
    }

    /// `false` only for [`TaskError::Raw`].
    pub fn is_recognized(&self) -> bool {
        !matches!(self, TaskError::Raw(_))
    }

    /// Whether this error (or the one it wraps) is a cancellation.
    pub fn is_canceled(&self) -> bool {
        match self {
            TaskError::Canceled => true,
            TaskError::Annotated { source, .. } => source.is_canceled(),
            _ => false,
        }
    }

    /// Attaches executor name and id to a recognized error.
    ///
    /// Raw payloads and already annotated errors are returned unchanged.
    ///
    /// # Example
    /// ```
    /// use tickvisor::{TaskError, TaskId};
    ///
    /// let err = TaskError::fail("boom").annotate("worker-x", TaskId::new());
    /// let text = err.to_string();
    /// assert!(text.contains("boom"));
    /// assert!(text.contains("worker-x"));
    /// ```
    pub fn annotate(self, task: impl Into<Arc<str>>, id: TaskId) -> Self {
        match self {
            TaskError::Raw(_) | TaskError::Annotated { .. } => self,
            other => TaskError::Annotated {
                source: Box::new(other),
                task: task.into(),
                id,
            },
        }
    }

    /// Strips an annotation, returning the original error.
    pub fn root(&self) -> &TaskError {
        match self {
            TaskError::Annotated { source, .. } => source.root(),
            other => other,
        }
    }
}

/// # Errors produced by the executor pool.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some executors did not reach `stopped`.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the executors that were still draining.
        stuck: Vec<String>,
    },

    /// Registering OS signal handlers failed.
    #[error("signal handler registration failed: {0}")]
    Signal(#[from] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tickvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Signal(_) => "runtime_signal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_message_is_bare_text() {
        let err = TaskError::fail("boom");
        assert_eq!(err.message(), "boom");
        assert_eq!(err.to_string(), "execution failed: boom");
        assert!(err.is_recognized());
    }

    #[test]
    fn test_raw_is_passed_through() {
        let id = TaskId::new();
        let err = TaskError::raw("string error").annotate("worker", id);
        assert!(matches!(&err, TaskError::Raw(v) if v == "string error"));
        assert_eq!(err.message(), "string error");
        assert!(!err.is_recognized());
    }

    #[test]
    fn test_annotate_appends_name_and_id() {
        let id = TaskId::new();
        let err = TaskError::fail("boom").annotate("worker-x", id);
        let text = err.to_string();
        assert!(text.contains("boom"));
        assert!(text.contains("worker-x"));
        assert!(text.contains(&id.to_string()));
        assert_eq!(err.as_label(), "task_failed");
        assert!(matches!(err.root(), TaskError::Fail { .. }));
    }

    #[test]
    fn test_annotate_is_not_nested() {
        let id = TaskId::new();
        let once = TaskError::Canceled.annotate("a", id);
        let twice = once.clone().annotate("b", id);
        assert_eq!(once.to_string(), twice.to_string());
        assert!(twice.is_canceled());
    }

    #[test]
    fn test_timeout_message() {
        let err = TaskError::Timeout {
            timeout: Duration::from_millis(200),
        };
        assert_eq!(err.message(), "timed out after 200ms");
        assert_eq!(err.as_label(), "task_timeout");
    }

    #[test]
    fn test_config_labels_are_distinct() {
        let all = [
            ConfigError::NotARecord { found: "array".into() },
            ConfigError::InvalidName,
            ConfigError::InvalidInterval { value: "-1".into() },
            ConfigError::InvalidTimeout { value: "\"x\"".into() },
            ConfigError::MissingWork,
            ConfigError::InvalidOnError,
        ];
        let mut labels: Vec<_> = all.iter().map(ConfigError::as_label).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), all.len());
        for e in &all {
            assert!(e.to_string().starts_with("invalid configuration"));
        }
    }
}
