//! Admission control: free capacity bounds every claim.

use crate::prelude::*;
use tokio::time::{sleep, Duration};

#[tokio::test(start_paused = true)]
async fn a_full_worker_stops_asking_for_work() {
    let h = harness(1);
    let gate = h.engine.gate_results();
    h.queue.push(h.task("t1", 0));
    h.queue.push(h.task("t2", 0));
    let (stop_tx, handle) = h.start();

    // Tick A claims the only free slot.
    sleep(Duration::from_millis(50)).await;
    assert_eq!(h.queue.claim_calls(), vec![1]);
    assert_eq!(h.manager.registry().len(), 1);

    // Tick B (and more) observe free == 0: no queue call, no dispatch.
    sleep(Duration::from_secs(3)).await;
    assert_eq!(h.queue.claim_calls(), vec![1]);
    assert_eq!(h.manager.registry().len(), 1);

    // Completion frees the slot; the next tick dispatches the second task.
    gate.release(1);
    sleep(Duration::from_secs(2)).await;
    assert_eq!(h.queue.claim_calls(), vec![1, 1]);

    gate.release(1);
    stop_tx.send(true).unwrap();
    let summary = handle.await.unwrap();
    assert_eq!(summary.completed, 2);
    assert!(h.manager.registry().is_empty());
}

#[tokio::test(start_paused = true)]
async fn registry_never_exceeds_capacity() {
    let h = harness(2);
    let gate = h.engine.gate_results();
    for i in 0..6 {
        h.queue.push(h.task("t", i));
    }
    let (stop_tx, handle) = h.start();

    for _ in 0..5 {
        sleep(Duration::from_secs(1)).await;
        assert!(h.manager.registry().len() <= 2);
    }

    gate.release(6);
    sleep(Duration::from_secs(5)).await;
    stop_tx.send(true).unwrap();
    let summary = handle.await.unwrap();
    assert_eq!(summary.completed, 6);
    assert!(h.manager.registry().is_empty());
}

#[tokio::test(start_paused = true)]
async fn claims_are_bounded_by_free_capacity_not_queue_depth() {
    let h = harness(2);
    let gate = h.engine.gate_results();
    for i in 0..4 {
        h.queue.push(h.task("t", i));
    }
    let (stop_tx, handle) = h.start();

    sleep(Duration::from_millis(50)).await;
    // The first claim asked for at most the full capacity.
    assert_eq!(h.queue.claim_calls(), vec![2]);
    assert_eq!(h.manager.registry().len(), 2);

    gate.release(4);
    sleep(Duration::from_secs(3)).await;
    stop_tx.send(true).unwrap();
    let summary = handle.await.unwrap();
    assert_eq!(summary.completed, 4);
}
