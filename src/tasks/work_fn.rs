//! # Function-backed unit of work (`WorkFn`)
//!
//! [`WorkFn`] wraps a closure `F: Fn(CancellationToken) -> Fut`, producing a fresh
//! future per iteration. State shared between iterations must be held explicitly
//! (e.g. an `Arc<AtomicUsize>` captured by the closure).
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use tickvisor::{WorkFn, WorkRef, TaskError};
//!
//! let w: WorkRef = WorkFn::arc(|ctx: CancellationToken| async move {
//!     if ctx.is_cancelled() {
//!         return Err(TaskError::Canceled);
//!     }
//!     Ok::<_, TaskError>(())
//! });
//! # let _ = w;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::work::Work;

/// Function-backed unit of work.
pub struct WorkFn<F> {
    f: F,
}

impl<F> WorkFn<F> {
    /// Wraps a closure.
    ///
    /// Prefer [`WorkFn::arc`] when you immediately need a [`WorkRef`](crate::WorkRef).
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps a closure and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Work for WorkFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        (self.f)(ctx).await
    }
}
