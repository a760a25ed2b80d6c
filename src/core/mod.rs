//! Runtime core: executors, their loop and the pool.
//!
//! Internal modules:
//! - [`executor`]: the [`TaskExecutor`] handle, its lifecycle and the background loop;
//! - [`runner`]: executes one iteration with timeout/cancellation and outcome publishing;
//! - [`builder`]: typed construction and validation;
//! - [`config`]: constants, sentinel handling and untyped settings;
//! - [`state`]: lifecycle phases;
//! - [`pool`]: independent executors sharing one bus, graceful shutdown;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod config;
mod executor;
mod pool;
pub(crate) mod runner;
mod shutdown;
mod state;

pub use builder::ExecutorBuilder;
pub use config::{ErrorHandler, ExecutorSettings, MIN_INTERVAL, PoolConfig, WAIT_GUARD};
pub use executor::{Diagnostics, TaskExecutor};
pub use pool::{ExecutorPool, PoolBuilder};
pub use shutdown::wait_for_shutdown_signal;
pub use state::Phase;
