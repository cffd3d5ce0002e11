//! Contract tests for the job queue: enqueue/dequeue semantics, dependency
//! ordering, cancellation, leases and persistence.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use composer_lite::error::Error;
use composer_lite::queue::{sweeper, JobQueue};

fn types(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

async fn push_test_job(queue: &JobQueue, job_type: &str, args: &Value, deps: &[Uuid]) -> Uuid {
    queue
        .enqueue(job_type, args, deps)
        .await
        .expect("enqueue failed")
}

/// Dequeue the next job of the given type, check its deps, and finish it.
async fn finish_next_test_job(
    queue: &JobQueue,
    job_type: &str,
    result: &Value,
    deps: &[Uuid],
) -> Uuid {
    let cancel = CancellationToken::new();
    let job = queue
        .dequeue(&cancel, &types(&[job_type]))
        .await
        .expect("dequeue failed");
    assert_eq!(job.job_type, job_type);
    assert_eq!(job.deps, deps);
    queue.finish_job(job.id, result).await.expect("finish failed");
    job.id
}

#[tokio::test]
async fn test_errors() {
    let queue = JobQueue::new();

    // Args that cannot be encoded as JSON (map with non-string keys).
    let bad_args: HashMap<(u32, u32), u32> = HashMap::from([((1, 2), 3)]);
    let err = queue.enqueue("test", &bad_args, &[]).await.unwrap_err();
    assert!(matches!(err, Error::BadArgs(_)));

    // Unknown dependency: nothing is mutated.
    let ghost = Uuid::new_v4();
    let err = queue
        .enqueue("test", &json!("arg0"), &[ghost])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownDep(d) if d == ghost));

    // The token is removed after the job finishes.
    let id = push_test_job(&queue, "octopus", &Value::Null, &[]).await;
    let cancel = CancellationToken::new();
    let job = queue.dequeue(&cancel, &types(&["octopus"])).await.unwrap();
    assert_eq!(job.id, id);

    assert_eq!(queue.id_from_token(job.token).await.unwrap(), id);
    queue.finish_job(id, &Value::Null).await.unwrap();
    assert!(matches!(
        queue.id_from_token(job.token).await.unwrap_err(),
        Error::NotExist
    ));
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TestArgs {
    i: i64,
    s: String,
}

#[tokio::test]
async fn test_args_round_trip() {
    let queue = JobQueue::new();

    let one_args = TestArgs { i: 7, s: "🐠".to_string() };
    let one = queue.enqueue("fish", &one_args, &[]).await.unwrap();
    let two_args = TestArgs { i: 42, s: "🐙".to_string() };
    let two = queue.enqueue("octopus", &two_args, &[]).await.unwrap();

    let cancel = CancellationToken::new();
    let job = queue.dequeue(&cancel, &types(&["octopus"])).await.unwrap();
    assert_eq!(job.id, two);
    assert!(job.deps.is_empty());
    let parsed: TestArgs = serde_json::from_str(job.args.get()).unwrap();
    assert_eq!(parsed, two_args);

    // Job() returns the same parameters after the dequeue.
    let (job_type, args, deps) = queue.job(two).await.unwrap();
    assert_eq!(job_type, "octopus");
    assert_eq!(args.get(), job.args.get());
    assert!(deps.is_empty());

    let job = queue.dequeue(&cancel, &types(&["fish"])).await.unwrap();
    assert_eq!(job.id, one);
    let parsed: TestArgs = serde_json::from_str(job.args.get()).unwrap();
    assert_eq!(parsed, one_args);

    assert!(matches!(
        queue.job(Uuid::new_v4()).await.unwrap_err(),
        Error::NotExist
    ));
}

#[tokio::test]
async fn test_fifo_within_type() {
    let queue = JobQueue::new();

    let mut expected = Vec::new();
    for i in 0..5 {
        expected.push(push_test_job(&queue, "t", &json!(i), &[]).await);
    }
    for id in expected {
        assert_eq!(
            finish_next_test_job(&queue, "t", &json!({}), &[]).await,
            id
        );
    }
}

#[tokio::test]
async fn test_job_types() {
    let queue = JobQueue::new();

    let one = push_test_job(&queue, "octopus", &Value::Null, &[]).await;
    let two = push_test_job(&queue, "clownfish", &Value::Null, &[]).await;

    assert_eq!(
        finish_next_test_job(&queue, "clownfish", &json!({}), &[]).await,
        two
    );
    assert_eq!(
        finish_next_test_job(&queue, "octopus", &json!({}), &[]).await,
        one
    );
}

#[tokio::test]
async fn test_dequeue_timeout() {
    let queue = JobQueue::new();

    // Pre-canceled context returns promptly.
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = queue.dequeue(&cancel, &types(&["zebra"])).await.unwrap_err();
    assert!(matches!(err, Error::DequeueTimeout));

    // Cancellation while blocked also returns.
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });
    let err = queue
        .dequeue(&cancel, &types(&["octopus"]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DequeueTimeout));
}

#[tokio::test]
async fn test_dependencies_done_before_pushing_dependant() {
    let queue = JobQueue::new();

    let one = push_test_job(&queue, "test", &Value::Null, &[]).await;
    let two = push_test_job(&queue, "test", &Value::Null, &[]).await;

    let mut finished = Vec::new();
    finished.push(finish_next_test_job(&queue, "test", &json!({}), &[]).await);
    finished.push(finish_next_test_job(&queue, "test", &json!({}), &[]).await);
    finished.sort();
    let mut expected = vec![one, two];
    expected.sort();
    assert_eq!(finished, expected);

    let dependant = push_test_job(&queue, "test", &Value::Null, &[one, two]).await;
    let status = queue.job_status(dependant).await.unwrap();
    assert_eq!(status.job_type, "test");
    assert!(status.started_at.is_none());
    assert!(status.finished_at.is_none());
    assert!(!status.canceled);
    assert_eq!(status.deps, vec![one, two]);

    assert_eq!(
        finish_next_test_job(&queue, "test", &json!({}), &[one, two]).await,
        dependant
    );

    let status = queue.job_status(dependant).await.unwrap();
    assert!(status.started_at.is_some());
    assert!(status.finished_at.is_some());
    assert!(status.result.is_some());
}

#[tokio::test]
async fn test_dependencies_done_after_pushing_dependant() {
    let queue = JobQueue::new();

    let one = push_test_job(&queue, "test", &Value::Null, &[]).await;
    let two = push_test_job(&queue, "test", &Value::Null, &[]).await;
    let dependant = push_test_job(&queue, "test", &Value::Null, &[one, two]).await;

    let status = queue.job_status(dependant).await.unwrap();
    assert!(status.started_at.is_none());

    finish_next_test_job(&queue, "test", &json!({}), &[]).await;
    finish_next_test_job(&queue, "test", &json!({}), &[]).await;

    // Both deps finished, the dependant is next in line.
    assert_eq!(
        finish_next_test_job(&queue, "test", &json!({}), &[one, two]).await,
        dependant
    );

    // A finished job's finish time is at or after each dep's.
    let status = queue.job_status(dependant).await.unwrap();
    for dep in &status.deps {
        let dep_status = queue.job_status(*dep).await.unwrap();
        assert!(status.finished_at.unwrap() >= dep_status.finished_at.unwrap());
    }
}

#[tokio::test]
async fn test_multiple_workers() {
    let queue = Arc::new(JobQueue::new());

    let blocked = {
        let queue = queue.clone();
        tokio::spawn(async move {
            let cancel = CancellationToken::new();
            let job = queue.dequeue(&cancel, &types(&["octopus"])).await.unwrap();
            assert_eq!(job.job_type, "octopus");
            assert!(job.deps.is_empty());
        })
    };

    // Give the worker a chance to park in dequeue.
    tokio::time::sleep(Duration::from_millis(10)).await;

    // A dequeue for a different type must not block on the parked one.
    let id = push_test_job(&queue, "clownfish", &Value::Null, &[]).await;
    let cancel = CancellationToken::new();
    let job = queue
        .dequeue(&cancel, &types(&["clownfish"]))
        .await
        .unwrap();
    assert_eq!(job.id, id);

    // Wake the parked worker.
    push_test_job(&queue, "octopus", &Value::Null, &[]).await;
    blocked.await.unwrap();
}

#[tokio::test]
async fn test_multiple_workers_single_job_type() {
    let queue = Arc::new(JobQueue::new());

    let workers: Vec<_> = (0..2)
        .map(|_| {
            let queue = queue.clone();
            tokio::spawn(async move {
                let cancel = CancellationToken::new();
                let job = queue
                    .dequeue(&cancel, &types(&["clownfish"]))
                    .await
                    .unwrap();
                assert_eq!(job.job_type, "clownfish");
            })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(10)).await;
    push_test_job(&queue, "clownfish", &Value::Null, &[]).await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    push_test_job(&queue, "clownfish", &Value::Null, &[]).await;

    for worker in workers {
        worker.await.unwrap();
    }
}

#[tokio::test]
async fn test_blocked_dequeue_wakes_on_promotion() {
    let queue = Arc::new(JobQueue::new());

    let dep = push_test_job(&queue, "first", &Value::Null, &[]).await;
    let dependant = push_test_job(&queue, "second", &Value::Null, &[dep]).await;

    let blocked = {
        let queue = queue.clone();
        tokio::spawn(async move {
            let cancel = CancellationToken::new();
            queue.dequeue(&cancel, &types(&["second"])).await.unwrap()
        })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Finishing the dep promotes the dependant and wakes the worker.
    finish_next_test_job(&queue, "first", &json!({}), &[]).await;
    let job = blocked.await.unwrap();
    assert_eq!(job.id, dependant);
    assert_eq!(job.deps, vec![dep]);
}

#[tokio::test]
async fn test_cancel() {
    let queue = JobQueue::new();

    // Cancel a non-existing job.
    assert!(matches!(
        queue.cancel_job(Uuid::new_v4()).await.unwrap_err(),
        Error::NotExist
    ));

    // Cancel a pending job.
    let id = push_test_job(&queue, "clownfish", &Value::Null, &[]).await;
    queue.cancel_job(id).await.unwrap();
    let status = queue.job_status(id).await.unwrap();
    assert!(status.canceled);
    assert!(status.result.is_none());
    assert!(matches!(
        queue.finish_job(id, &json!({})).await.unwrap_err(),
        Error::NotRunning
    ));

    // Cancel a running job; the canceled job above must not be dequeued.
    let id = push_test_job(&queue, "clownfish", &Value::Null, &[]).await;
    let cancel = CancellationToken::new();
    let job = queue
        .dequeue(&cancel, &types(&["clownfish"]))
        .await
        .unwrap();
    assert_eq!(job.id, id);
    queue.cancel_job(id).await.unwrap();
    let status = queue.job_status(id).await.unwrap();
    assert!(status.canceled);
    assert!(matches!(
        queue.finish_job(id, &json!({})).await.unwrap_err(),
        Error::NotRunning
    ));
    // The lease is gone as well.
    assert!(matches!(
        queue.id_from_token(job.token).await.unwrap_err(),
        Error::NotExist
    ));

    // Canceling a finished job is refused.
    let id = push_test_job(&queue, "clownfish", &Value::Null, &[]).await;
    let job = queue
        .dequeue(&cancel, &types(&["clownfish"]))
        .await
        .unwrap();
    assert_eq!(job.id, id);
    queue.finish_job(id, &json!({})).await.unwrap();
    assert!(matches!(
        queue.cancel_job(id).await.unwrap_err(),
        Error::NotRunning
    ));
    let status = queue.job_status(id).await.unwrap();
    assert!(!status.canceled);
    assert!(status.result.is_some());
}

#[tokio::test]
async fn test_cancel_propagates_to_dependants() {
    let queue = JobQueue::new();

    let root = push_test_job(&queue, "t", &Value::Null, &[]).await;
    let child = push_test_job(&queue, "t", &Value::Null, &[root]).await;
    let grandchild = push_test_job(&queue, "t", &Value::Null, &[child]).await;
    let sibling = push_test_job(&queue, "t", &Value::Null, &[]).await;

    queue.cancel_job(root).await.unwrap();

    for id in [root, child, grandchild] {
        assert!(queue.job_status(id).await.unwrap().canceled);
    }
    assert!(!queue.job_status(sibling).await.unwrap().canceled);

    // Only the unrelated job is left in the ready queue.
    assert_eq!(
        finish_next_test_job(&queue, "t", &json!({}), &[]).await,
        sibling
    );
}

#[tokio::test]
async fn test_heartbeats() {
    let queue = JobQueue::new();

    let id = push_test_job(&queue, "octopus", &Value::Null, &[]).await;
    // No heartbeats for a queued job.
    assert!(queue.heartbeats(Duration::ZERO).await.is_empty());

    let cancel = CancellationToken::new();
    let job = queue.dequeue(&cancel, &types(&["octopus"])).await.unwrap();
    assert_eq!(job.id, id);

    assert!(queue.heartbeats(Duration::ZERO).await.contains(&job.token));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(queue
        .heartbeats(Duration::from_millis(50))
        .await
        .contains(&job.token));

    // Refreshing resets the age.
    queue.refresh_heartbeat(job.token).await;
    assert!(queue.heartbeats(Duration::from_millis(50)).await.is_empty());

    assert!(queue
        .heartbeats(Duration::from_secs(24 * 3600))
        .await
        .is_empty());

    assert_eq!(queue.id_from_token(job.token).await.unwrap(), id);
    queue.finish_job(id, &json!({})).await.unwrap();

    // No heartbeats for a finished job.
    assert!(queue.heartbeats(Duration::ZERO).await.is_empty());
    assert!(matches!(
        queue.id_from_token(job.token).await.unwrap_err(),
        Error::NotExist
    ));
}

#[tokio::test]
async fn test_dequeue_by_id() {
    let queue = JobQueue::new();

    // Basic: picks the named job, not the oldest.
    let one = push_test_job(&queue, "octopus", &Value::Null, &[]).await;
    let two = push_test_job(&queue, "octopus", &Value::Null, &[]).await;

    let job = queue.dequeue_by_id(two).await.unwrap();
    assert_eq!(job.id, two);
    assert_eq!(job.job_type, "octopus");
    assert!(job.deps.is_empty());
    queue.finish_job(two, &Value::Null).await.unwrap();

    assert_eq!(
        finish_next_test_job(&queue, "octopus", &json!({}), &[]).await,
        one
    );

    // A job with unfinished deps cannot be picked.
    let dep = push_test_job(&queue, "octopus", &Value::Null, &[]).await;
    let blocked = push_test_job(&queue, "octopus", &Value::Null, &[dep]).await;
    assert!(matches!(
        queue.dequeue_by_id(blocked).await.unwrap_err(),
        Error::NotPending
    ));
    assert_eq!(
        finish_next_test_job(&queue, "octopus", &json!({}), &[]).await,
        dep
    );
    let job = queue.dequeue_by_id(blocked).await.unwrap();
    assert_eq!(job.id, blocked);
    assert_eq!(job.deps, vec![dep]);
    queue.finish_job(blocked, &Value::Null).await.unwrap();

    // Running and finished jobs cannot be picked either.
    let id = push_test_job(&queue, "octopus", &Value::Null, &[]).await;
    let cancel = CancellationToken::new();
    queue.dequeue(&cancel, &types(&["octopus"])).await.unwrap();
    assert!(matches!(
        queue.dequeue_by_id(id).await.unwrap_err(),
        Error::NotPending
    ));
    queue.finish_job(id, &Value::Null).await.unwrap();
    assert!(matches!(
        queue.dequeue_by_id(id).await.unwrap_err(),
        Error::NotPending
    ));

    // Unknown jobs are distinguishable from non-pending ones.
    assert!(matches!(
        queue.dequeue_by_id(Uuid::new_v4()).await.unwrap_err(),
        Error::NotExist
    ));
}

#[tokio::test]
async fn test_single_token_per_job() {
    let queue = JobQueue::new();

    let id = push_test_job(&queue, "t", &Value::Null, &[]).await;
    let cancel = CancellationToken::new();
    let job = queue.dequeue(&cancel, &types(&["t"])).await.unwrap();
    assert_eq!(job.id, id);

    // The job is leased; no second token can be minted for it.
    assert!(matches!(
        queue.dequeue_by_id(id).await.unwrap_err(),
        Error::NotPending
    ));
    assert_eq!(queue.heartbeats(Duration::ZERO).await.len(), 1);
}

#[tokio::test]
async fn test_sweeper_reaps_stale_leases() {
    let queue = Arc::new(JobQueue::new());

    let id = push_test_job(&queue, "t", &Value::Null, &[]).await;
    let cancel = CancellationToken::new();
    let job = queue.dequeue(&cancel, &types(&["t"])).await.unwrap();
    assert_eq!(job.id, id);

    let stop = CancellationToken::new();
    let sweeper = tokio::spawn(sweeper::run_sweeper(
        queue.clone(),
        Duration::from_millis(10),
        Duration::ZERO,
        stop.clone(),
    ));

    tokio::time::sleep(Duration::from_millis(50)).await;
    stop.cancel();
    sweeper.await.unwrap();

    let status = queue.job_status(id).await.unwrap();
    assert!(status.canceled);
    assert!(matches!(
        queue.finish_job(id, &json!({})).await.unwrap_err(),
        Error::NotRunning
    ));
}

#[tokio::test]
async fn test_persistence_reload() {
    let dir = tempfile::tempdir().unwrap();

    let one;
    let two;
    let dependant;
    {
        let queue = JobQueue::with_persistence(dir.path()).await.unwrap();
        one = push_test_job(&queue, "t", &json!({"n": 1}), &[]).await;
        two = push_test_job(&queue, "t", &json!({"n": 2}), &[]).await;
        dependant = push_test_job(&queue, "t", &Value::Null, &[one, two]).await;

        assert_eq!(
            finish_next_test_job(&queue, "t", &json!({"ok": true}), &[]).await,
            one
        );
        // Lease `two` but never finish it: the restart must re-queue it.
        let job = queue.dequeue_by_id(two).await.unwrap();
        assert_eq!(job.id, two);
    }

    let queue = JobQueue::with_persistence(dir.path()).await.unwrap();

    // Finished state survived, args round-tripped.
    let status = queue.job_status(one).await.unwrap();
    assert!(status.finished_at.is_some());
    let result: Value = serde_json::from_str(status.result.unwrap().get()).unwrap();
    assert_eq!(result, json!({"ok": true}));

    let (_, args, _) = queue.job(two).await.unwrap();
    let parsed: Value = serde_json::from_str(args.get()).unwrap();
    assert_eq!(parsed, json!({"n": 2}));

    // The interrupted job is pending again; the dependant is still blocked.
    let status = queue.job_status(two).await.unwrap();
    assert!(status.started_at.is_none());
    assert!(matches!(
        queue.dequeue_by_id(dependant).await.unwrap_err(),
        Error::NotPending
    ));

    assert_eq!(
        finish_next_test_job(&queue, "t", &json!({}), &[]).await,
        two
    );
    assert_eq!(
        finish_next_test_job(&queue, "t", &json!({}), &[one, two]).await,
        dependant
    );
}

#[tokio::test]
async fn test_persistence_survives_cancel() {
    let dir = tempfile::tempdir().unwrap();

    let root;
    let child;
    {
        let queue = JobQueue::with_persistence(dir.path()).await.unwrap();
        root = push_test_job(&queue, "t", &Value::Null, &[]).await;
        child = push_test_job(&queue, "t", &Value::Null, &[root]).await;
        queue.cancel_job(root).await.unwrap();
    }

    let queue = JobQueue::with_persistence(dir.path()).await.unwrap();
    assert!(queue.job_status(root).await.unwrap().canceled);
    assert!(queue.job_status(child).await.unwrap().canceled);

    // Nothing to dequeue.
    let cancel = CancellationToken::new();
    cancel.cancel();
    assert!(matches!(
        queue.dequeue(&cancel, &types(&["t"])).await.unwrap_err(),
        Error::DequeueTimeout
    ));
}
