//! One claim flows through the whole lifecycle and leaves nothing behind.

use crate::prelude::*;
use tokio::time::{sleep, Duration};

#[tokio::test(start_paused = true)]
async fn single_task_runs_the_full_pipeline() {
    let h = harness(2);
    h.queue.push(h.task("t1", 0));
    let (stop_tx, handle) = h.start();

    sleep(Duration::from_millis(50)).await;
    stop_tx.send(true).unwrap();
    let summary = handle.await.unwrap();

    assert_eq!(summary.completed, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.rejected, 0);

    // Ordered hook trace around the sandbox.
    assert_eq!(
        h.plugin.trace_for("t1/0"),
        vec![
            "prepare",
            "build_sandbox",
            "started",
            "stopped",
            "finished(true)",
            "dispose"
        ]
    );

    // The registry ends empty and the scratch area was disposed.
    assert!(h.manager.registry().is_empty());
    assert!(h.scratch_is_empty());

    // The engine saw exactly this one task.
    assert_eq!(h.engine.built_keys(), vec!["t1/0"]);
    assert_eq!(h.engine.started_keys(), vec!["t1/0"]);
}

#[tokio::test(start_paused = true)]
async fn engine_and_plugins_parse_disjoint_payload_parts() {
    let h = harness(1);
    h.queue.push(h.task("t1", 0));
    let (stop_tx, handle) = h.start();

    sleep(Duration::from_millis(50)).await;
    stop_tx.send(true).unwrap();
    handle.await.unwrap();

    // The pipeline only ever saw its own subtree of the payload.
    assert_eq!(
        h.plugin.payload_for("t1/0"),
        Some(serde_json::json!({"p": 2}))
    );
}

#[tokio::test(start_paused = true)]
async fn unsuccessful_tasks_still_resolve_through_finished() {
    let h = harness(1);
    h.engine.set_result_success(false);
    h.queue.push(h.task("t1", 0));
    let (stop_tx, handle) = h.start();

    sleep(Duration::from_millis(50)).await;
    stop_tx.send(true).unwrap();
    let summary = handle.await.unwrap();

    // success=false is a resolution, not a failure.
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(
        h.plugin.trace_for("t1/0"),
        vec![
            "prepare",
            "build_sandbox",
            "started",
            "stopped",
            "finished(false)",
            "dispose"
        ]
    );
}
