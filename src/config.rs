// Central configuration: environment-derived wiring plus the immutable
// point/limit/cap tables the scoring and cohort engines read from.
//
// All secrets and endpoints come from env vars (never hardcoded); the .env
// file is loaded automatically at startup via dotenvy.

use std::env;
use std::time::Duration;

use anyhow::Result;

use crate::scoring::categories::InteractionCategory;

/// Runtime configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    pub db_path: String,
    pub postgres_url: String,
    pub vector_store_path: String,
    pub queue_path: String,
    pub quality_model_endpoint: String,
    pub quality_model_api_key: String,
    pub gibberish_model_dir: String,
    pub worker_count: usize,
    pub queue_visibility_timeout: Duration,
    pub scheduler_cadence: Duration,
    pub bind_addr: String,
    pub port: u16,
    pub points: PointsConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Only `db_path` and the worker/timeout knobs have defaults — the
    /// quality-model endpoint is required for anything beyond sync
    /// interactions and the daily cohort run.
    pub fn load() -> Result<Self> {
        Ok(Self {
            db_path: env::var("REWARD_ENGINE_DB_PATH")
                .unwrap_or_else(|_| "./reward_engine.db".to_string()),
            postgres_url: env::var("POSTGRES_URL").unwrap_or_default(),
            vector_store_path: env::var("VECTOR_STORE_PATH")
                .unwrap_or_else(|_| "./content_index.db".to_string()),
            queue_path: env::var("QUEUE_DB_PATH").unwrap_or_else(|_| "./job_queue.db".to_string()),
            quality_model_endpoint: env::var("QUALITY_MODEL_ENDPOINT").unwrap_or_default(),
            quality_model_api_key: env::var("QUALITY_MODEL_API_KEY").unwrap_or_default(),
            gibberish_model_dir: env::var("GIBBERISH_MODEL_DIR")
                .unwrap_or_else(|_| "./models/gibberish".to_string()),
            worker_count: env::var("WORKER_COUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4),
            queue_visibility_timeout: Duration::from_secs(
                env::var("QUEUE_VISIBILITY_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(300),
            ),
            scheduler_cadence: Duration::from_secs(
                env::var("SCHEDULER_CADENCE_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(86400),
            ),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            points: PointsConfig::default(),
        })
    }

    /// Check that the quality-model endpoint is configured.
    /// Call this before any operation that needs C5 scoring.
    pub fn require_quality_model(&self) -> Result<()> {
        if self.quality_model_endpoint.is_empty() {
            anyhow::bail!(
                "QUALITY_MODEL_ENDPOINT not set. Add it to your .env file.\n\
                 See .env.example for the required variables."
            );
        }
        Ok(())
    }

    /// Check that a postgres URL is configured (only relevant when built
    /// with the `postgres` feature).
    pub fn require_postgres(&self) -> Result<()> {
        if self.postgres_url.is_empty() {
            anyhow::bail!("POSTGRES_URL not set. Add it to your .env file.");
        }
        Ok(())
    }
}

/// Per-category point award, daily limit, monthly cap, and empathy weight.
#[derive(Debug, Clone, Copy)]
pub struct CategoryConfig {
    pub point_value: f64,
    pub daily_limit: u32,
    pub monthly_cap: f64,
    pub empathy_weight: f64,
}

/// Immutable scoring configuration — point awards, limits, caps, thresholds.
/// Tunable at build time; never mutated after construction.
#[derive(Debug, Clone)]
pub struct PointsConfig {
    pub post: CategoryConfig,
    pub like: CategoryConfig,
    pub comment: CategoryConfig,
    pub referral: CategoryConfig,
    pub tip: CategoryConfig,
    pub crypto: CategoryConfig,

    pub quality_bonus_max: f64,
    pub originality_bonus_max: f64,

    pub streak_weight: f64,
    pub empathy_fraction: f64,

    pub consonant_run_threshold: f64,
    pub mean_token_length_threshold: f64,
    pub ml_confidence_threshold: f64,

    pub duplicate_distance_threshold: f64,
}

impl PointsConfig {
    pub fn for_category(&self, category: InteractionCategory) -> CategoryConfig {
        match category {
            InteractionCategory::Post => self.post,
            InteractionCategory::Like => self.like,
            InteractionCategory::Comment => self.comment,
            InteractionCategory::Referral => self.referral,
            InteractionCategory::Tip => self.tip,
            InteractionCategory::Crypto => self.crypto,
        }
    }

    /// Sum of every category's monthly cap — the normalization denominator.
    pub fn total_monthly_cap(&self) -> f64 {
        self.post.monthly_cap
            + self.like.monthly_cap
            + self.comment.monthly_cap
            + self.referral.monthly_cap
            + self.tip.monthly_cap
            + self.crypto.monthly_cap
    }
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            post: CategoryConfig {
                point_value: 0.5,
                daily_limit: 2,
                monthly_cap: 30.0,
                empathy_weight: 0.25,
            },
            like: CategoryConfig {
                point_value: 0.1,
                daily_limit: 5,
                monthly_cap: 15.0,
                empathy_weight: 0.08,
            },
            comment: CategoryConfig {
                point_value: 0.1,
                daily_limit: 5,
                monthly_cap: 15.0,
                empathy_weight: 0.08,
            },
            referral: CategoryConfig {
                point_value: 10.0,
                daily_limit: 1,
                monthly_cap: 10.0,
                empathy_weight: 0.05,
            },
            tip: CategoryConfig {
                point_value: 0.5,
                daily_limit: 1,
                monthly_cap: 20.0,
                empathy_weight: 0.05,
            },
            crypto: CategoryConfig {
                point_value: 0.5,
                daily_limit: 3,
                monthly_cap: 20.0,
                empathy_weight: 0.09,
            },
            quality_bonus_max: 1.0,
            originality_bonus_max: 0.25,
            streak_weight: 0.5,
            empathy_fraction: 0.10,
            consonant_run_threshold: 0.85,
            mean_token_length_threshold: 20.0,
            ml_confidence_threshold: 0.85,
            duplicate_distance_threshold: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_monthly_cap_is_110() {
        let cfg = PointsConfig::default();
        assert!((cfg.total_monthly_cap() - 110.0).abs() < 1e-9);
    }

    #[test]
    fn for_category_matches_field() {
        let cfg = PointsConfig::default();
        assert_eq!(cfg.for_category(InteractionCategory::Like).daily_limit, 5);
        assert_eq!(
            cfg.for_category(InteractionCategory::Referral).point_value,
            10.0
        );
    }
}
