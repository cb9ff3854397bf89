// Validator (C6) — composes the content index, gibberish classifier, and
// quality scorer into the single decision a post submission needs.

use std::sync::Arc;

use anyhow::Result;

use crate::config::PointsConfig;
use crate::content_index::{ContentIndex, Post};
use crate::gibberish::GibberishClassifier;
use crate::quality::{QualityResult, QualityScorer};

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Accepted {
        quality: u8,
        quality_degraded: bool,
        originality: f64,
        matched_id: Option<String>,
    },
    Rejected {
        reason: String,
    },
}

pub struct Validator {
    content_index: Arc<dyn ContentIndex>,
    gibberish: GibberishClassifier,
    quality: Arc<dyn QualityScorer>,
}

impl Validator {
    pub fn new(
        content_index: Arc<dyn ContentIndex>,
        gibberish: GibberishClassifier,
        quality: Arc<dyn QualityScorer>,
    ) -> Self {
        Self {
            content_index,
            gibberish,
            quality,
        }
    }

    pub async fn validate(
        &self,
        post_id: &str,
        user_id: &str,
        content: &str,
        image: Option<&[u8]>,
        config: &PointsConfig,
    ) -> Result<ValidationOutcome> {
        let verdict = self.gibberish.classify(content, config).await;
        if let crate::gibberish::GibberishVerdict::Gibberish { reason } = verdict {
            return Ok(ValidationOutcome::Rejected { reason });
        }

        let nearest = self.content_index.nearest(content, image).await?;
        if let Some(ref matched) = nearest {
            if matched.distance <= config.duplicate_distance_threshold {
                return Ok(ValidationOutcome::Rejected {
                    reason: format!("duplicate of {}", matched.matched_post_id),
                });
            }
        }

        let QualityResult { score, degraded } = self.quality.score(content, image).await?;

        let insert_result = self
            .content_index
            .insert(&Post {
                post_id: post_id.to_string(),
                user_id: user_id.to_string(),
                content: content.to_string(),
                image: image.map(|bytes| bytes.to_vec()),
            })
            .await;

        if insert_result.is_err() {
            return Ok(ValidationOutcome::Rejected {
                reason: "post_id conflict".to_string(),
            });
        }

        let originality = match nearest {
            Some(m) => m.distance.min(1.0),
            None => 1.0,
        };

        Ok(ValidationOutcome::Accepted {
            quality: score,
            quality_degraded: degraded,
            originality,
            matched_id: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_index::{HashingEncoder, SqliteContentIndex};
    use async_trait::async_trait;
    use rusqlite::Connection;

    struct FixedQuality(u8);

    #[async_trait]
    impl QualityScorer for FixedQuality {
        async fn score(&self, _text: &str, _image: Option<&[u8]>) -> Result<QualityResult> {
            Ok(QualityResult::ok(self.0))
        }
    }

    fn validator(quality: u8) -> Validator {
        let index = Arc::new(
            SqliteContentIndex::new(Connection::open_in_memory().unwrap(), Arc::new(HashingEncoder))
                .unwrap(),
        );
        Validator::new(index, GibberishClassifier::without_ml(), Arc::new(FixedQuality(quality)))
    }

    #[tokio::test]
    async fn gibberish_is_rejected_before_other_checks() {
        let validator = validator(8);
        let config = PointsConfig::default();
        let outcome = validator
            .validate("p1", "u1", "asdfghjkl asdfghjkl", None, &config)
            .await
            .unwrap();
        assert!(matches!(outcome, ValidationOutcome::Rejected { .. }));
    }

    #[tokio::test]
    async fn first_post_is_accepted_with_full_originality() {
        let validator = validator(8);
        let config = PointsConfig::default();
        let outcome = validator
            .validate("p1", "u1", "A thoughtful essay about urban planning policy.", None, &config)
            .await
            .unwrap();
        match outcome {
            ValidationOutcome::Accepted {
                quality, originality, ..
            } => {
                assert_eq!(quality, 8);
                assert_eq!(originality, 1.0);
            }
            other => panic!("expected accepted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn near_duplicate_is_rejected() {
        let validator = validator(8);
        let config = PointsConfig::default();
        validator
            .validate(
                "p1",
                "u1",
                "A thoughtful essay about urban planning policy.",
                None,
                &config,
            )
            .await
            .unwrap();

        let outcome = validator
            .validate(
                "p2",
                "u2",
                "A thoughtful essay about urban planning policy.",
                None,
                &config,
            )
            .await
            .unwrap();
        assert!(matches!(outcome, ValidationOutcome::Rejected { .. }));
    }

    #[tokio::test]
    async fn duplicate_post_id_is_rejected_with_conflict_reason() {
        let validator = validator(8);
        let config = PointsConfig::default();
        validator
            .validate("p1", "u1", "First distinct post about gardening tips.", None, &config)
            .await
            .unwrap();

        let outcome = validator
            .validate(
                "p1",
                "u2",
                "A completely different post about mountain climbing routes.",
                None,
                &config,
            )
            .await
            .unwrap();
        match outcome {
            ValidationOutcome::Rejected { reason } => assert_eq!(reason, "post_id conflict"),
            other => panic!("expected rejected, got {other:?}"),
        }
    }
}
