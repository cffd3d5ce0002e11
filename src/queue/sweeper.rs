//! Reaps jobs whose worker stopped heartbeating.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::queue::JobQueue;

/// Run the stale-lease sweeper until the cancellation token fires.
///
/// Every `interval`, leases older than `timeout` are collected and the
/// corresponding jobs canceled. Canceling drops the lease, so a worker that
/// comes back late sees `NotRunning` on its finish attempt.
pub async fn run_sweeper(
    queue: Arc<JobQueue>,
    interval: Duration,
    timeout: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    tracing::info!(
        interval_ms = interval.as_millis() as u64,
        timeout_ms = timeout.as_millis() as u64,
        "Lease sweeper started",
    );

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Lease sweeper shutting down");
                break;
            }
            _ = ticker.tick() => {
                sweep(&queue, timeout).await;
            }
        }
    }
}

async fn sweep(queue: &JobQueue, timeout: Duration) {
    for token in queue.heartbeats(timeout).await {
        let id = match queue.id_from_token(token).await {
            Ok(id) => id,
            // Lease retired between enumeration and lookup.
            Err(_) => continue,
        };
        tracing::warn!(job_id = %id, %token, "Worker heartbeat expired, canceling job");
        if let Err(error) = queue.cancel_job(id).await {
            tracing::warn!(job_id = %id, %error, "Failed to cancel stale job");
        }
    }
}
