//! # Unit-of-work abstraction.
//!
//! A unit of work is the caller-supplied async operation a
//! [`TaskExecutor`](crate::TaskExecutor) invokes once per tick. It receives a
//! [`CancellationToken`] that is cancelled when the iteration times out or the
//! executor is disposed, and should check it to stop cooperatively.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Shared handle to a unit of work.
pub type WorkRef = Arc<dyn Work>;

/// # Asynchronous, cancelable unit of work.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use tickvisor::{Work, TaskError};
///
/// struct Poll;
///
/// #[async_trait]
/// impl Work for Poll {
///     async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
///         if ctx.is_cancelled() {
///             return Err(TaskError::Canceled);
///         }
///         // fetch the next batch...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Work: Send + Sync + 'static {
    /// Performs one iteration of work.
    ///
    /// Implementations should check `ctx.is_cancelled()` (or await `ctx.cancelled()`)
    /// and return promptly once it fires.
    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError>;
}
