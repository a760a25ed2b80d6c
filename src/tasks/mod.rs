//! # Units of work and executor identity.
//!
//! This module provides the work-related types:
//! - [`Work`] - trait for implementing an async, cancelable unit of work
//! - [`WorkFn`] - function-based implementation
//! - [`WorkRef`] - shared reference to a unit of work (`Arc<dyn Work>`)
//! - [`TaskId`] - globally unique executor identifier

mod id;
mod work;
mod work_fn;

pub use id::TaskId;
pub use work::{Work, WorkRef};
pub use work_fn::WorkFn;
