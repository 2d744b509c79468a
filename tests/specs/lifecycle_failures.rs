//! Mid-lifecycle failures unwind exactly what was acquired.

use crate::prelude::*;
use tokio::time::{sleep, Duration};

#[tokio::test(start_paused = true)]
async fn prepare_failure_disposes_plugins_and_context() {
    let h = harness(2);
    h.plugin.fail_prepare();
    h.queue.push(h.task("t1", 0));
    let (stop_tx, handle) = h.start();

    sleep(Duration::from_millis(50)).await;
    stop_tx.send(true).unwrap();
    let summary = handle.await.unwrap();

    assert_eq!(summary.failed, 1);
    // No sandbox was built, but the plugins existed and were disposed.
    assert!(h.engine.built_keys().is_empty());
    assert_eq!(h.plugin.trace_for("t1/0"), vec!["prepare", "dispose"]);
    assert!(h.manager.registry().is_empty());
    assert!(h.scratch_is_empty());
}

#[tokio::test(start_paused = true)]
async fn sandbox_crash_skips_stopped_and_finished() {
    let h = harness(2);
    h.engine.fail_next_wait("sandbox crashed");
    h.queue.push(h.task("t1", 0));
    let (stop_tx, handle) = h.start();

    sleep(Duration::from_millis(50)).await;
    stop_tx.send(true).unwrap();
    let summary = handle.await.unwrap();

    assert_eq!(summary.failed, 1);
    // The runner never notified stopped on a result that never existed.
    assert_eq!(
        h.plugin.trace_for("t1/0"),
        vec!["prepare", "build_sandbox", "started", "dispose"]
    );
    assert!(h.manager.registry().is_empty());
    assert!(h.scratch_is_empty());
}

#[tokio::test(start_paused = true)]
async fn plugin_failures_never_leak_registry_slots() {
    let h = harness(1);
    h.plugin.fail_started();
    h.queue.push(h.task("t1", 0));
    h.queue.push(h.task("t2", 0));
    let (stop_tx, handle) = h.start();

    // Both tasks fail at started, one per tick; slots keep being freed.
    sleep(Duration::from_secs(2)).await;
    stop_tx.send(true).unwrap();
    let summary = handle.await.unwrap();

    assert_eq!(summary.failed, 2);
    assert!(h.manager.registry().is_empty());
    assert!(h.scratch_is_empty());
}
