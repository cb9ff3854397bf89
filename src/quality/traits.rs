// Quality scorer trait (C5).

use anyhow::Result;
use async_trait::async_trait;

use super::models::QualityResult;

#[async_trait]
pub trait QualityScorer: Send + Sync {
    /// Score a post's effort, creativity, and clarity on a 0..=10 scale.
    /// Never returns `Err` — a persistently failing remote model degrades
    /// to a neutral default rather than blocking the validator.
    async fn score(&self, text: &str, image: Option<&[u8]>) -> Result<QualityResult>;
}
