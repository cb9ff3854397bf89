// SqliteJobQueue — durable FIFO backed by a sqlite table. A claimed job is
// marked invisible until `visibility_timeout` elapses; if the worker never
// acks it (crash, panic), the next `claim_next` call picks it back up.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;

use super::models::{ClaimedJob, PostJob};
use super::traits::JobQueue;

pub struct SqliteJobQueue {
    conn: Mutex<Connection>,
    visibility_timeout: Duration,
}

impl SqliteJobQueue {
    pub fn open(path: &str, visibility_timeout: Duration) -> Result<Self> {
        let conn =
            Connection::open(path).with_context(|| format!("Failed to open queue at {path}"))?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            visibility_timeout,
        })
    }

    pub fn new(conn: Connection, visibility_timeout: Duration) -> Result<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            visibility_timeout,
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                payload TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                visible_at INTEGER NOT NULL DEFAULT 0,
                attempt INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_jobs_status_visible ON jobs(status, visible_at);",
        )
        .context("Failed to create queue schema")?;
        Ok(())
    }
}

#[async_trait]
impl JobQueue for SqliteJobQueue {
    async fn enqueue(&self, job: PostJob) -> Result<()> {
        let conn = self.conn.lock().await;
        let payload = serde_json::to_string(&job)?;
        let now = Utc::now().timestamp_millis();
        conn.execute(
            "INSERT INTO jobs (payload, status, visible_at, attempt, created_at)
             VALUES (?1, 'pending', 0, 0, ?2)",
            params![payload, now],
        )?;
        Ok(())
    }

    async fn claim_next(&self) -> Result<Option<ClaimedJob>> {
        let conn = self.conn.lock().await;
        let now = Utc::now().timestamp_millis();

        let row: Option<(i64, String, u32)> = conn
            .query_row(
                "SELECT id, payload, attempt FROM jobs
                 WHERE (status = 'pending') OR (status = 'processing' AND visible_at < ?1)
                 ORDER BY id ASC LIMIT 1",
                params![now],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((job_id, payload, attempt)) = row else {
            return Ok(None);
        };

        let next_attempt = attempt + 1;
        let visible_at = now + self.visibility_timeout.as_millis() as i64;
        conn.execute(
            "UPDATE jobs SET status = 'processing', visible_at = ?1, attempt = ?2 WHERE id = ?3",
            params![visible_at, next_attempt, job_id],
        )?;

        let job: PostJob = serde_json::from_str(&payload)?;
        Ok(Some(ClaimedJob {
            job_id,
            attempt: next_attempt,
            job,
        }))
    }

    async fn ack(&self, job_id: i64) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM jobs WHERE id = ?1", params![job_id])?;
        Ok(())
    }

    async fn nack(&self, job_id: i64) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE jobs SET status = 'pending', visible_at = 0 WHERE id = ?1",
            params![job_id],
        )?;
        Ok(())
    }

    async fn pending_count(&self) -> Result<usize> {
        let conn = self.conn.lock().await;
        let now = Utc::now().timestamp_millis();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE (status = 'pending') OR (status = 'processing' AND visible_at < ?1)",
            params![now],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job(post_id: &str) -> PostJob {
        PostJob {
            post_id: post_id.to_string(),
            creator_id: "creator".to_string(),
            interactor_id: "interactor".to_string(),
            content: "hello world".to_string(),
            image: None,
            webhook_url: None,
        }
    }

    fn memory_queue(timeout: Duration) -> SqliteJobQueue {
        SqliteJobQueue::new(Connection::open_in_memory().unwrap(), timeout).unwrap()
    }

    #[tokio::test]
    async fn enqueue_then_claim_round_trips() {
        let queue = memory_queue(Duration::from_secs(300));
        queue.enqueue(sample_job("p1")).await.unwrap();

        let claimed = queue.claim_next().await.unwrap().unwrap();
        assert_eq!(claimed.job.post_id, "p1");
        assert_eq!(claimed.attempt, 1);
    }

    #[tokio::test]
    async fn claimed_job_is_invisible_until_acked_or_timed_out() {
        let queue = memory_queue(Duration::from_secs(300));
        queue.enqueue(sample_job("p1")).await.unwrap();
        queue.claim_next().await.unwrap().unwrap();

        assert!(queue.claim_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ack_removes_the_job() {
        let queue = memory_queue(Duration::from_secs(300));
        queue.enqueue(sample_job("p1")).await.unwrap();
        let claimed = queue.claim_next().await.unwrap().unwrap();
        queue.ack(claimed.job_id).await.unwrap();
        assert_eq!(queue.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn nack_makes_the_job_immediately_visible_again() {
        let queue = memory_queue(Duration::from_secs(300));
        queue.enqueue(sample_job("p1")).await.unwrap();
        let claimed = queue.claim_next().await.unwrap().unwrap();
        queue.nack(claimed.job_id).await.unwrap();

        let reclaimed = queue.claim_next().await.unwrap().unwrap();
        assert_eq!(reclaimed.job.post_id, "p1");
        assert_eq!(reclaimed.attempt, 2);
    }

    #[tokio::test]
    async fn fifo_order_is_preserved() {
        let queue = memory_queue(Duration::from_secs(300));
        queue.enqueue(sample_job("p1")).await.unwrap();
        queue.enqueue(sample_job("p2")).await.unwrap();

        let first = queue.claim_next().await.unwrap().unwrap();
        assert_eq!(first.job.post_id, "p1");
    }
}
