// Worker pool for the task queue (C8): a fixed number of workers, spawned
// as tokio tasks, compete for jobs, each running the supplied handler to
// completion before acking. A handler error leaves the job for immediate
// nack-based retry rather than blocking the whole pool.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use super::models::PostJob;
use super::traits::JobQueue;

pub type JobHandler =
    Arc<dyn Fn(PostJob) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> + Send + Sync>;

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    shutdown: Arc<Notify>,
}

impl WorkerPool {
    pub fn spawn(queue: Arc<dyn JobQueue>, worker_count: usize, handler: JobHandler) -> Self {
        let shutdown = Arc::new(Notify::new());
        let handles = (0..worker_count)
            .map(|worker_id| {
                let queue = Arc::clone(&queue);
                let handler = Arc::clone(&handler);
                let shutdown = Arc::clone(&shutdown);
                tokio::spawn(async move { worker_loop(worker_id, queue, handler, shutdown).await })
            })
            .collect();

        Self { handles, shutdown }
    }

    /// Signal all workers to stop after their current job and wait for them.
    pub async fn shutdown(self) {
        self.shutdown.notify_waiters();
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<dyn JobQueue>,
    handler: JobHandler,
    shutdown: Arc<Notify>,
) {
    loop {
        let claimed = tokio::select! {
            result = queue.claim_next() => result,
            _ = shutdown.notified() => return,
        };

        match claimed {
            Ok(Some(claimed)) => {
                let job_id = claimed.job_id;
                let post_id = claimed.job.post_id.clone();
                match handler(claimed.job).await {
                    Ok(()) => {
                        if let Err(err) = queue.ack(job_id).await {
                            error!(worker_id, post_id, "failed to ack job: {err:#}");
                        }
                    }
                    Err(err) => {
                        warn!(worker_id, post_id, attempt = claimed.attempt, "job handler failed, requeueing: {err:#}");
                        if let Err(err) = queue.nack(job_id).await {
                            error!(worker_id, post_id, "failed to nack job: {err:#}");
                        }
                    }
                }
            }
            Ok(None) => {
                tokio::select! {
                    _ = tokio::time::sleep(IDLE_POLL_INTERVAL) => {},
                    _ = shutdown.notified() => return,
                }
            }
            Err(err) => {
                error!(worker_id, "failed to claim job: {err:#}");
                tokio::time::sleep(IDLE_POLL_INTERVAL).await;
            }
        }
    }
}
