// System status display — shows score-store, content-index, and job-queue
// stats as a handful of cheap read-only queries rendered as plain lines, no
// framework around it.

use std::sync::Arc;

use anyhow::Result;

use crate::content_index::ContentIndex;
use crate::db::ScoreStore;
use crate::queue::JobQueue;

pub async fn show(
    store: &Arc<dyn ScoreStore>,
    content_index: &Arc<dyn ContentIndex>,
    queue: &Arc<dyn JobQueue>,
    db_path: &str,
) -> Result<()> {
    println!("Score store: {db_path}");

    let user_ids = store.all_user_ids().await?;
    println!("Users with a ledger row: {}", user_ids.len());

    let post_count = content_index.count().await?;
    println!("Posts in content index: {post_count}");

    let pending = queue.pending_count().await?;
    if pending == 0 {
        println!("Job queue: empty");
    } else {
        println!("Job queue: {pending} pending/in-flight");
    }

    Ok(())
}
