//! # Example: ticker
//!
//! One executor polling a flaky source every second.
//!
//! Shows how to:
//! - Build a [`TaskExecutor`] with interval, timeout and error callback.
//! - Observe every iteration through the executor's [`Bus`](tickvisor::Bus).
//! - Dispose it and wait for the loop to drain.
//!
//! ## Flow
//! ```text
//! start() ──► iteration ──► Outcome ──► printer
//!                │ Err ──► on_error (annotated with name and id)
//!                └─► wait rest of interval ──► next iteration
//! dispose() ──► Stopping ──► Stopped
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example ticker
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tickvisor::{TaskError, TaskExecutor};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let polls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&polls);

    let exec = TaskExecutor::builder("flaky-source")
        .interval(Duration::from_secs(1))
        .timeout(Duration::from_millis(300))
        .work_fn(move |ctx: CancellationToken| {
            let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
            async move {
                // Every third poll hangs and is cut off by the timeout.
                let delay = if n % 3 == 0 { 1_000 } else { 50 };
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_millis(delay)) => {}
                    _ = ctx.cancelled() => return Err(TaskError::Canceled),
                }
                if n % 4 == 0 {
                    return Err(TaskError::fail(format!("poll #{n} returned garbage")));
                }
                Ok(())
            }
        })
        .on_error(|err| tracing::warn!(label = err.as_label(), %err, "poll failed"))
        .build()?;

    let mut records = exec.bus().subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(rec) = records.recv().await {
            println!("{}", rec.to_json());
        }
    });

    exec.start();
    tokio::time::sleep(Duration::from_secs(8)).await;

    exec.dispose();
    exec.stopped().await;
    println!("{}", serde_json::to_string_pretty(&exec.diagnostics())?);

    drop(exec);
    printer.await?;
    Ok(())
}
