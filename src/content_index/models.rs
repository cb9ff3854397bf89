// Data models for the content index (C3).

use serde::{Deserialize, Serialize};

/// A post as stored in the content index: caller-chosen `post_id`, the
/// author, its text, and an optional image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub post_id: String,
    pub user_id: String,
    pub content: String,
    pub image: Option<Vec<u8>>,
}

/// Result of a nearest-neighbour query: the distance to the closest match
/// (0.0 = identical, larger = more different) and the matched post's id.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestMatch {
    pub distance: f64,
    pub matched_post_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    /// `post_id` exists but belongs to a different user.
    UserMismatch,
}
