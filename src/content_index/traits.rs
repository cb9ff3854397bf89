// Content index trait (C3) — vector store of posts supporting insert,
// nearest-neighbour query, delete by (post_id, user_id), and count.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{DeleteOutcome, NearestMatch, Post};

#[async_trait]
pub trait ContentIndex: Send + Sync {
    /// Insert a post, assigning it a vector. Returns an error if `post_id`
    /// already exists (the conflict the validator surfaces as
    /// "post_id conflict").
    async fn insert(&self, post: &Post) -> Result<()>;

    /// Nearest neighbour to `(text, image)` by cosine distance in [0, 1].
    /// `None` when the index is empty.
    async fn nearest(&self, text: &str, image: Option<&[u8]>) -> Result<Option<NearestMatch>>;

    /// Delete by `(post_id, user_id)`. Fails with `UserMismatch` if
    /// `post_id` exists but belongs to a different user.
    async fn delete(&self, post_id: &str, user_id: &str) -> Result<DeleteOutcome>;

    async fn count(&self) -> Result<usize>;
}
