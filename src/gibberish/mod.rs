// Gibberish classifier (C4) — rule, statistical, and optional ML stages
// applied in order; the first positive signal fails the text. A classifier
// that errors is treated as "ok" (fail-open): it never blocks otherwise
// valid content.

pub mod models;
pub mod rules;
pub mod statistical;
pub mod traits;

#[cfg(feature = "ml-classifier")]
pub mod ml;

use std::sync::Arc;

use tracing::warn;

use crate::config::PointsConfig;
pub use models::GibberishVerdict;
pub use traits::GibberishModel;

pub struct GibberishClassifier {
    ml_model: Option<Arc<dyn GibberishModel>>,
}

impl GibberishClassifier {
    pub fn new(ml_model: Option<Arc<dyn GibberishModel>>) -> Self {
        Self { ml_model }
    }

    pub fn without_ml() -> Self {
        Self { ml_model: None }
    }

    pub async fn classify(&self, text: &str, config: &PointsConfig) -> GibberishVerdict {
        if let Some(reason) = rules::check(text, config.consonant_run_threshold) {
            return GibberishVerdict::Gibberish { reason };
        }

        if let Some(reason) = statistical::check(text, config.mean_token_length_threshold) {
            return GibberishVerdict::Gibberish { reason };
        }

        if let Some(model) = &self.ml_model {
            match model.gibberish_confidence(text).await {
                Ok(confidence) if confidence >= config.ml_confidence_threshold => {
                    return GibberishVerdict::Gibberish {
                        reason: format!("ML classifier confidence {confidence:.2}"),
                    };
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("gibberish ML classifier failed, failing open: {err:#}");
                }
            }
        }

        GibberishVerdict::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn normal_text_is_ok() {
        let classifier = GibberishClassifier::without_ml();
        let config = PointsConfig::default();
        let verdict = classifier
            .classify("This is a thoughtful post about urban planning.", &config)
            .await;
        assert_eq!(verdict, GibberishVerdict::Ok);
    }

    #[tokio::test]
    async fn keyboard_mash_is_gibberish() {
        let classifier = GibberishClassifier::without_ml();
        let config = PointsConfig::default();
        let verdict = classifier.classify("asdfghjkl asdfghjkl", &config).await;
        assert!(verdict.is_gibberish());
    }

    struct AlwaysGibberish;

    #[async_trait::async_trait]
    impl GibberishModel for AlwaysGibberish {
        async fn gibberish_confidence(&self, _text: &str) -> anyhow::Result<f64> {
            Ok(0.99)
        }
    }

    #[tokio::test]
    async fn ml_stage_catches_what_earlier_stages_miss() {
        let classifier = GibberishClassifier::new(Some(Arc::new(AlwaysGibberish)));
        let config = PointsConfig::default();
        let verdict = classifier
            .classify("This reads fine to the rule and statistical stages.", &config)
            .await;
        assert!(verdict.is_gibberish());
    }

    struct AlwaysErrors;

    #[async_trait::async_trait]
    impl GibberishModel for AlwaysErrors {
        async fn gibberish_confidence(&self, _text: &str) -> anyhow::Result<f64> {
            anyhow::bail!("model unavailable")
        }
    }

    #[tokio::test]
    async fn ml_failure_fails_open() {
        let classifier = GibberishClassifier::new(Some(Arc::new(AlwaysErrors)));
        let config = PointsConfig::default();
        let verdict = classifier
            .classify("This reads fine to the rule and statistical stages.", &config)
            .await;
        assert_eq!(verdict, GibberishVerdict::Ok);
    }
}
