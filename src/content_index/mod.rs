// Content index (C3) — near-duplicate detection over submitted posts.

pub mod encoder;
pub mod models;
pub mod sqlite;
pub mod traits;

pub use encoder::{cosine_distance, HashingEncoder, TextEncoder, ENCODER_DIM};
pub use models::{DeleteOutcome, NearestMatch, Post};
pub use sqlite::SqliteContentIndex;
pub use traits::ContentIndex;
