// Task queue (C8) — durable FIFO queue of post/comment jobs plus a worker
// pool that pulls from it.

pub mod models;
pub mod sqlite;
pub mod traits;
pub mod worker;

pub use models::{ClaimedJob, PostJob};
pub use sqlite::SqliteJobQueue;
pub use traits::JobQueue;
pub use worker::{JobHandler, WorkerPool};
