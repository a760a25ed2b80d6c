//! # Example: pool
//!
//! Several executors, configured from JSON, sharing one pool bus.
//!
//! Shows how to:
//! - Validate untyped settings with [`ExecutorSettings::from_json`].
//! - Wire executors to the pool's bus via [`ExecutorPool::bus`].
//! - Attach the built-in [`LogWriter`] subscriber.
//! - Shut down on Ctrl-C / SIGTERM with a grace period.
//!
//! ## Run
//! ```bash
//! RUST_LOG=tickvisor=debug cargo run --example pool
//! ```

use std::sync::Arc;
use std::time::Duration;

use tickvisor::{ExecutorBuilder, ExecutorPool, ExecutorSettings, LogWriter, PoolConfig, Subscribe, TaskError};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const QUEUES: &[&str] = &[
    r#"{ "name": "emails",   "interval": 1500, "timeout": 500 }"#,
    r#"{ "name": "invoices", "interval": 3000 }"#,
    r#"{ "name": "reports",  "interval": 200 }"#,
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "tickvisor=debug".into()),
        )
        .init();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let mut pool = ExecutorPool::builder(PoolConfig {
        grace: Duration::from_secs(5),
        ..PoolConfig::default()
    })
    .with_subscribers(subs)
    .build();

    for doc in QUEUES {
        let settings = ExecutorSettings::from_json(doc)?;
        let queue = settings.name.clone();
        let exec = ExecutorBuilder::from_settings(settings)
            .bus(pool.bus().clone())
            .work_fn(move |ctx: CancellationToken| {
                let queue = queue.clone();
                async move {
                    if ctx.is_cancelled() {
                        return Err(TaskError::Canceled);
                    }
                    tracing::info!(%queue, "draining queue");
                    Ok(())
                }
            })
            .build()?;
        pool.add(exec);
    }

    tracing::info!(executors = ?pool.names(), "pool ready, press Ctrl-C to stop");
    pool.run_until_signal().await?;
    Ok(())
}
