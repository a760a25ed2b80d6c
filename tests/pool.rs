//! Several executors sharing one pool bus.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use tickvisor::{
    ExecutorBuilder, ExecutorPool, ExecutorSettings, Outcome, Phase, PoolConfig, Subscribe, TaskError, TaskExecutor,
};

#[derive(Default)]
struct Tally {
    by_name: Mutex<HashMap<String, (usize, usize)>>,
}

#[async_trait]
impl Subscribe for Tally {
    async fn on_outcome(&self, o: &Outcome) {
        let mut map = self.by_name.lock().unwrap();
        let entry = map.entry(o.params.name.to_string()).or_default();
        if o.success {
            entry.0 += 1;
        } else {
            entry.1 += 1;
        }
    }

    fn name(&self) -> &'static str {
        "tally"
    }
}

#[tokio::test(start_paused = true)]
async fn failures_stay_isolated_per_executor() {
    let tally = Arc::new(Tally::default());
    let mut pool = ExecutorPool::builder(PoolConfig::default())
        .with_subscribers(vec![tally.clone() as Arc<dyn Subscribe>])
        .build();

    let healthy = pool
        .builder_for("healthy")
        .work_fn(|_ctx: CancellationToken| async { Ok::<(), TaskError>(()) })
        .build()
        .unwrap();
    let broken = pool
        .builder_for("broken")
        .work_fn(|_ctx: CancellationToken| async { Err::<(), _>(TaskError::fail("down")) })
        .on_error(|_| {})
        .build()
        .unwrap();
    pool.add(healthy);
    pool.add(broken);
    assert_eq!(pool.len(), 2);

    pool.start_all();
    assert!(pool.iter().all(|e| e.state() == Phase::Active));
    sleep(Duration::from_millis(2500)).await;
    pool.shutdown().await.unwrap();

    let map = tally.by_name.lock().unwrap();
    assert_eq!(map.get("healthy"), Some(&(3, 0)));
    assert_eq!(map.get("broken"), Some(&(0, 3)));
}

#[tokio::test(start_paused = true)]
async fn outside_receivers_see_interleaved_records() {
    let mut pool = ExecutorPool::new(PoolConfig::default());
    let mut rx = pool.bus().subscribe();

    for name in ["a", "b", "c"] {
        let exec = pool
            .builder_for(name)
            .work_fn(|_ctx: CancellationToken| async { Ok::<(), TaskError>(()) })
            .build()
            .unwrap();
        pool.add(exec);
    }
    pool.start_all();

    let mut names = Vec::new();
    let mut last_seq = None;
    for _ in 0..3 {
        let rec = rx.recv().await.unwrap();
        if let Some(prev) = last_seq {
            assert!(rec.seq > prev);
        }
        last_seq = Some(rec.seq);
        names.push(rec.params.name.to_string());
    }
    names.sort();
    assert_eq!(names, vec!["a", "b", "c"]);

    pool.dispose_all();
    pool.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn executors_from_settings_join_the_pool() {
    let mut pool = ExecutorPool::new(PoolConfig::default());
    let raw = r#"[
        { "name": "emails", "interval": 2000 },
        { "name": "invoices", "interval": 10, "timeout": 0 }
    ]"#;
    let docs: Vec<serde_json::Value> = serde_json::from_str(raw).unwrap();

    for doc in &docs {
        let settings = ExecutorSettings::from_value(doc).unwrap();
        let exec = ExecutorBuilder::from_settings(settings)
            .bus(pool.bus().clone())
            .work_fn(|_ctx: CancellationToken| async { Ok::<(), TaskError>(()) })
            .build()
            .unwrap();
        pool.add(exec);
    }

    assert_eq!(pool.names(), vec!["emails", "invoices"]);
    let intervals: Vec<_> = pool.iter().map(TaskExecutor::interval).collect();
    assert_eq!(
        intervals,
        vec![Duration::from_millis(2000), Duration::from_millis(1000)]
    );
    let timeouts: Vec<_> = pool.iter().map(TaskExecutor::timeout).collect();
    assert_eq!(timeouts, vec![None, Some(Duration::ZERO)]);
    pool.shutdown().await.unwrap();
}
