//! Payload validation failures stop the task before any sandbox work.

use crate::prelude::*;
use serde_json::json;
use stint_core::{FieldKind, PayloadSchema};
use stint_engine::FakeEngine;
use stint_plugins::FakePlugin;
use tokio::time::{sleep, Duration};

#[tokio::test(start_paused = true)]
async fn non_object_payload_fails_without_any_sandbox_work() {
    let h = harness(2);
    h.queue.push(h.task_with_payload("t1", json!("not an object")));
    let (stop_tx, handle) = h.start();

    sleep(Duration::from_millis(50)).await;
    stop_tx.send(true).unwrap();
    let summary = handle.await.unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.completed, 0);

    // No sandbox was created and no plugin was ever constructed, so no hook
    // (not even finished or dispose) fired.
    assert!(h.engine.built_keys().is_empty());
    assert!(h.plugin.trace().is_empty());
    assert_eq!(h.plugin.payload_for("t1/0"), None);

    // Cleanup still closed the log, disposed the context, and deregistered.
    assert!(h.manager.registry().is_empty());
    assert!(h.scratch_is_empty());
}

#[tokio::test(start_paused = true)]
async fn schema_rejection_is_absorbed_and_the_loop_moves_on() {
    // Require a plugin field the first task lacks.
    let strict = FakePlugin::with_schema(
        PayloadSchema::part("plugins")
            .required("p", FieldKind::Integer)
            .build(),
    );
    let h = harness_with(1, FakeEngine::new(), strict);

    h.queue.push(h.task_with_payload("bad", json!({"e": 1})));
    h.queue.push(h.task("good", 0));
    let (stop_tx, handle) = h.start();

    sleep(Duration::from_secs(2)).await;
    stop_tx.send(true).unwrap();
    let summary = handle.await.unwrap();

    // The malformed task failed fast; the next claim still ran.
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.completed, 1);
    assert!(h.plugin.trace_for("bad/0").is_empty());
    assert_eq!(
        h.plugin.trace_for("good/0").last().map(String::as_str),
        Some("dispose")
    );
    assert!(h.manager.registry().is_empty());
}
