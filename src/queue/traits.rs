// Durable FIFO task queue trait (C8). At-least-once delivery: a job becomes
// visible again after `visibility_timeout` if it isn't acked, so callers
// must treat `post_id` as the idempotency key downstream.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{ClaimedJob, PostJob};

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: PostJob) -> Result<()>;

    /// Claim the oldest visible job, marking it invisible until the
    /// visibility timeout elapses. `None` when the queue is empty.
    async fn claim_next(&self) -> Result<Option<ClaimedJob>>;

    /// Remove a job permanently after it has been processed.
    async fn ack(&self, job_id: i64) -> Result<()>;

    /// Release `job_id` back to the queue immediately, without waiting out
    /// the visibility timeout (used when a worker knows a retry is safe).
    async fn nack(&self, job_id: i64) -> Result<()>;

    async fn pending_count(&self) -> Result<usize>;
}
