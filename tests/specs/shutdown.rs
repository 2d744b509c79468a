//! Stopping the loop: no new work, stragglers run to completion.

use crate::prelude::*;
use tokio::time::{sleep, Duration};

#[tokio::test(start_paused = true)]
async fn stop_halts_dispatch_but_not_running_tasks() {
    let h = harness(2);
    let gate = h.engine.gate_results();
    h.queue.push(h.task("t1", 0));
    h.queue.push(h.task("t2", 0));
    // A third task that must never be claimed.
    h.queue.push(h.task("t3", 0));
    let (stop_tx, handle) = h.start();

    sleep(Duration::from_millis(50)).await;
    assert_eq!(h.manager.registry().len(), 2);

    stop_tx.send(true).unwrap();
    sleep(Duration::from_secs(3)).await;

    // The loop is draining, not dead, and no tick fired after stop.
    assert!(!handle.is_finished());
    assert_eq!(h.queue.claim_calls(), vec![2]);
    assert_eq!(h.queue.pending_len(), 1);

    gate.release(2);
    let summary = handle.await.unwrap();
    assert_eq!(summary.completed, 2);
    assert!(h.manager.registry().is_empty());
    assert!(h.scratch_is_empty());
}

#[tokio::test(start_paused = true)]
async fn repeated_stop_signals_are_harmless() {
    let h = harness(1);
    let (stop_tx, handle) = h.start();

    sleep(Duration::from_millis(50)).await;
    stop_tx.send(true).unwrap();
    let _ = stop_tx.send(true);
    let _ = stop_tx.send(true);

    let summary = handle.await.unwrap();
    assert_eq!(summary, ShutdownSummary::default());
}

#[tokio::test(start_paused = true)]
async fn an_idle_worker_stops_promptly() {
    let h = harness(4);
    let (stop_tx, handle) = h.start();

    sleep(Duration::from_secs(5)).await;
    stop_tx.send(true).unwrap();
    let summary = handle.await.unwrap();

    assert_eq!(summary, ShutdownSummary::default());
    // Idle ticks still polled the queue with the full capacity.
    assert!(h.queue.claim_calls().iter().all(|max| *max == 4));
}
