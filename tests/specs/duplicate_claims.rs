//! Duplicate composite keys: the second runner aborts untouched.

use crate::prelude::*;
use tokio::time::{sleep, Duration};

#[tokio::test(start_paused = true)]
async fn second_claim_of_the_same_run_is_rejected() {
    let h = harness(2);
    let gate = h.engine.gate_results();
    h.queue.push(h.task("t1", 0));
    h.queue.push(h.task("t1", 0));
    let (stop_tx, handle) = h.start();

    sleep(Duration::from_millis(50)).await;
    // Exactly one registration survived.
    assert_eq!(h.manager.registry().len(), 1);
    assert!(h.manager.registry().contains("t1/0"));

    gate.release(1);
    stop_tx.send(true).unwrap();
    let summary = handle.await.unwrap();

    assert_eq!(summary.completed, 1);
    assert_eq!(summary.rejected, 1);
    // The first runner ran its pipeline exactly once, unaffected by the
    // rejected duplicate.
    assert_eq!(
        h.plugin
            .trace_for("t1/0")
            .iter()
            .filter(|hook| *hook == "prepare")
            .count(),
        1
    );
    assert!(h.manager.registry().is_empty());
    assert!(h.scratch_is_empty());
}

#[tokio::test(start_paused = true)]
async fn distinct_runs_of_one_task_are_not_duplicates() {
    let h = harness(2);
    h.queue.push(h.task("t1", 0));
    h.queue.push(h.task("t1", 1));
    let (stop_tx, handle) = h.start();

    sleep(Duration::from_millis(50)).await;
    stop_tx.send(true).unwrap();
    let summary = handle.await.unwrap();

    assert_eq!(summary.completed, 2);
    assert_eq!(summary.rejected, 0);
}
