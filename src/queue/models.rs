// Job payload and status for the durable task queue (C8).

use serde::{Deserialize, Serialize};

/// A post or comment submission awaiting validation and scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostJob {
    pub post_id: String,
    pub creator_id: String,
    pub interactor_id: String,
    pub content: String,
    pub image: Option<Vec<u8>>,
    pub webhook_url: Option<String>,
}

/// A job pulled off the queue, carrying the bookkeeping needed to ack it.
#[derive(Debug, Clone)]
pub struct ClaimedJob {
    pub job_id: i64,
    pub attempt: u32,
    pub job: PostJob,
}
