//! # Executor and pool configuration.
//!
//! Two ways to describe an executor:
//! 1. **Typed**: [`ExecutorBuilder`] (via [`TaskExecutor::builder`](crate::TaskExecutor::builder)),
//!    where interval and timeout are [`Duration`]s and a malformed shape does not compile.
//! 2. **Untyped input**: [`ExecutorSettings::from_value`] validates a JSON record and
//!    returns a tagged `Result` with one [`ConfigError`] per invalid field.
//!
//! ## Sentinel values
//! - no interval → [`MIN_INTERVAL`]; intervals below the floor are clamped up, never rejected
//! - no timeout → unbounded; `timeout = 0` is a real (immediate) bound
//! - `bus_capacity = 0` → clamped to 1 by the bus

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, TaskError};

/// Smallest interval an executor will ever use.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1000);

/// Remaining-time cutoff below which the inter-iteration wait is skipped.
pub const WAIT_GUARD: Duration = Duration::from_millis(100);

/// Callback receiving iteration errors.
pub type ErrorHandler = Arc<dyn Fn(TaskError) + Send + Sync>;

/// Interval actually used for scheduling: the floor, or `requested` if larger.
#[inline]
pub fn effective_interval(requested: Option<Duration>) -> Duration {
    requested.map_or(MIN_INTERVAL, |d| d.max(MIN_INTERVAL))
}

/// Default error callback: logs the error through `tracing` at `error` level.
pub fn default_error_handler() -> ErrorHandler {
    Arc::new(|err: TaskError| {
        tracing::error!(label = err.as_label(), error = %err, "iteration failed");
    })
}

/// Executor settings read from untyped input.
///
/// Intervals and timeouts are integer milliseconds. The unit of work and the error
/// callback cannot come from data; they are supplied separately.
///
/// ## Example
/// ```
/// use std::time::Duration;
/// use serde_json::json;
/// use tickvisor::{ConfigError, ExecutorSettings};
///
/// let s = ExecutorSettings::from_value(&json!({ "name": "poller", "interval": 250 })).unwrap();
/// assert_eq!(s.interval(), Some(Duration::from_millis(250)));
///
/// let err = ExecutorSettings::from_value(&json!({ "name": "poller", "timeout": -5 })).unwrap_err();
/// assert!(matches!(err, ConfigError::InvalidTimeout { .. }));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorSettings {
    /// Human-readable name (non-empty).
    pub name: String,
    /// Requested interval in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
    /// Per-iteration timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl ExecutorSettings {
    /// Settings with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interval: None,
            timeout: None,
        }
    }

    /// Validates a JSON value field by field.
    ///
    /// ### Errors
    /// - [`ConfigError::NotARecord`] if `value` is not an object
    /// - [`ConfigError::InvalidName`] if `name` is missing, not a string, or empty
    /// - [`ConfigError::InvalidInterval`] / [`ConfigError::InvalidTimeout`] if present
    ///   (and not `null`) but not a non-negative integer
    /// - [`ConfigError::MissingWork`] if a `unitOfWork` field is present (data is never callable)
    /// - [`ConfigError::InvalidOnError`] if an `onError` field is present
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let obj = value.as_object().ok_or_else(|| ConfigError::NotARecord {
            found: kind_of(value).to_string(),
        })?;

        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::InvalidName)?;

        let interval = millis_field(obj.get("interval"))
            .map_err(|value| ConfigError::InvalidInterval { value })?;
        let timeout = millis_field(obj.get("timeout"))
            .map_err(|value| ConfigError::InvalidTimeout { value })?;

        if obj.contains_key("unitOfWork") {
            return Err(ConfigError::MissingWork);
        }
        if obj.contains_key("onError") {
            return Err(ConfigError::InvalidOnError);
        }

        Ok(Self {
            name: name.to_string(),
            interval,
            timeout,
        })
    }

    /// Parses and validates a JSON document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(text).map_err(|_| ConfigError::NotARecord {
            found: "malformed json".to_string(),
        })?;
        Self::from_value(&value)
    }

    /// Requested interval as a `Duration`.
    pub fn interval(&self) -> Option<Duration> {
        self.interval.map(Duration::from_millis)
    }

    /// Requested timeout as a `Duration`.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_millis)
    }
}

impl TryFrom<&Value> for ExecutorSettings {
    type Error = ConfigError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// `Ok(None)` for absent/null, `Ok(Some(ms))` for a non-negative integer,
/// `Err(rendered)` otherwise.
fn millis_field(v: Option<&Value>) -> Result<Option<u64>, String> {
    match v {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_u64().map(Some).ok_or_else(|| v.to_string()),
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Configuration for an [`ExecutorPool`](crate::ExecutorPool).
///
/// ## Field semantics
/// - `grace`: how long `shutdown` waits for executors to reach `stopped`
/// - `bus_capacity`: ring buffer size of the pool's bus (min 1)
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Maximum time to wait for executors to drain on shutdown.
    pub grace: Duration,
    /// Capacity of the pool's broadcast channel.
    pub bus_capacity: usize,
}

impl PoolConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for PoolConfig {
    /// - `grace = 60s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(60),
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_interval_floor() {
        assert_eq!(effective_interval(None), MIN_INTERVAL);
        assert_eq!(effective_interval(Some(Duration::ZERO)), MIN_INTERVAL);
        assert_eq!(
            effective_interval(Some(Duration::from_millis(999))),
            MIN_INTERVAL
        );
        assert_eq!(
            effective_interval(Some(Duration::from_millis(2500))),
            Duration::from_millis(2500)
        );
    }

    #[test]
    fn test_settings_minimal_record() {
        let s = ExecutorSettings::from_value(&json!({ "name": "x" })).unwrap();
        assert_eq!(s, ExecutorSettings::new("x"));
        assert_eq!(s.interval(), None);
        assert_eq!(s.timeout(), None);
    }

    #[test]
    fn test_settings_null_fields_are_absent() {
        let s = ExecutorSettings::from_value(&json!({ "name": "x", "interval": null, "timeout": null }))
            .unwrap();
        assert_eq!(s.interval, None);
        assert_eq!(s.timeout, None);
    }

    #[test]
    fn test_settings_not_a_record() {
        for v in [json!([1, 2]), json!(3), json!("x"), json!(null)] {
            assert!(matches!(
                ExecutorSettings::from_value(&v),
                Err(ConfigError::NotARecord { .. })
            ));
        }
        assert!(matches!(
            ExecutorSettings::from_json("{ nope"),
            Err(ConfigError::NotARecord { .. })
        ));
    }

    #[test]
    fn test_settings_invalid_name() {
        for v in [json!({}), json!({ "name": "" }), json!({ "name": 7 })] {
            assert_eq!(ExecutorSettings::from_value(&v), Err(ConfigError::InvalidName));
        }
    }

    #[test]
    fn test_settings_invalid_interval_and_timeout() {
        for bad in [json!(-1), json!(1.5), json!("100"), json!(true)] {
            let v = json!({ "name": "x", "interval": bad.clone() });
            assert!(matches!(
                ExecutorSettings::from_value(&v),
                Err(ConfigError::InvalidInterval { .. })
            ));
            let v = json!({ "name": "x", "timeout": bad });
            assert!(matches!(
                ExecutorSettings::from_value(&v),
                Err(ConfigError::InvalidTimeout { .. })
            ));
        }
    }

    #[test]
    fn test_settings_reject_callables_in_data() {
        let v = json!({ "name": "x", "unitOfWork": "fetch()" });
        assert_eq!(ExecutorSettings::from_value(&v), Err(ConfigError::MissingWork));
        let v = json!({ "name": "x", "onError": 1 });
        assert_eq!(ExecutorSettings::from_value(&v), Err(ConfigError::InvalidOnError));
    }

    #[test]
    fn test_settings_from_json_text() {
        let s = ExecutorSettings::from_json(r#"{"name":"n","interval":0,"timeout":300}"#).unwrap();
        assert_eq!(s.interval(), Some(Duration::ZERO));
        assert_eq!(s.timeout(), Some(Duration::from_millis(300)));
    }

    #[test]
    fn test_pool_defaults() {
        let cfg = PoolConfig::default();
        assert_eq!(cfg.grace, Duration::from_secs(60));
        assert_eq!(cfg.bus_capacity_clamped(), 1024);
        let zero = PoolConfig {
            bus_capacity: 0,
            ..PoolConfig::default()
        };
        assert_eq!(zero.bus_capacity_clamped(), 1);
    }
}
