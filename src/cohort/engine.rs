// Cohort engine (C10) — once per day, partitions every user into
// qualified/non-qualified per category, updates streak and historical
// engagement score, and selects the empathy cohort.
//
// Guarded by the store's single-instance cohort lock so C10 can never run
// concurrently with itself — a hard lock rather than a soft
// already-running rejection, since this runs off a scheduler rather than
// a client request.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use crate::config::PointsConfig;
use crate::db::{ScoreStore, UserScoreRecord};
use crate::scoring::InteractionCategory;

use super::models::{CategoryCohort, CohortSummary};

pub struct CohortEngine {
    store: Arc<dyn ScoreStore>,
    config: PointsConfig,
}

impl CohortEngine {
    pub fn new(store: Arc<dyn ScoreStore>, config: PointsConfig) -> Self {
        Self { store, config }
    }

    pub async fn run(&self) -> Result<CohortSummary> {
        if !self.store.try_acquire_cohort_lock().await? {
            anyhow::bail!("cohort run already in progress");
        }

        let result = self.run_locked().await;

        self.store.release_cohort_lock().await?;
        result
    }

    async fn run_locked(&self) -> Result<CohortSummary> {
        let now = Utc::now();
        let today = now.date_naive();
        let cfg = self.config.clone();

        let user_ids = self.store.all_user_ids().await?;
        info!(user_count = user_ids.len(), "starting daily cohort run");

        let mut records = Vec::with_capacity(user_ids.len());
        for user_id in &user_ids {
            let cfg = cfg.clone();
            let record = self
                .store
                .cohort_update(
                    user_id,
                    today,
                    Box::new(move |record| update_streak_and_historical(record, now, &cfg)),
                )
                .await?;
            records.push(record);
        }

        Ok(build_summary(&records, now, &cfg))
    }
}

fn qualifies(record: &UserScoreRecord, category: InteractionCategory, now: DateTime<Utc>, cfg: &PointsConfig) -> bool {
    record.count_last_24h(category, now) as u32 >= cfg.for_category(category).daily_limit
}

fn is_active_today(record: &UserScoreRecord, now: DateTime<Utc>, cfg: &PointsConfig) -> bool {
    InteractionCategory::ALL
        .iter()
        .any(|c| qualifies(record, *c, now, cfg))
}

fn qualifies_all(record: &UserScoreRecord, now: DateTime<Utc>, cfg: &PointsConfig) -> bool {
    InteractionCategory::ALL
        .iter()
        .all(|c| qualifies(record, *c, now, cfg))
}

/// Streak and historical-score updates are two independent phases driven by
/// two different conditions, not a single active/inactive branch:
///
/// - The streak increments whenever the user is active in at least one
///   category today, and resets to 0 otherwise.
/// - The historical engagement score — the input to empathy ranking — is
///   computed for every user who is not a full qualifier (qualifying in
///   fewer than all six categories), and zeroed only for full qualifiers.
///   A partial qualifier is still active (so their streak increments) but
///   still needs a nonzero historical score for the categories they didn't
///   qualify in.
///
/// The pre-reset streak is captured before the streak mutation so the
/// historical score is always computed from the streak the user was on
/// coming into today, not the one they just earned or lost.
fn update_streak_and_historical(record: &mut UserScoreRecord, now: DateTime<Utc>, cfg: &PointsConfig) {
    let pre_reset_streak = record.consecutive_activity_days;

    record.consecutive_activity_days = if is_active_today(record, now, cfg) {
        pre_reset_streak + 1
    } else {
        0
    };

    if qualifies_all(record, now, cfg) {
        record.historical_engagement_score = 0.0;
    } else {
        let streak_component = pre_reset_streak as f64 * cfg.streak_weight;
        let activity_component: f64 = InteractionCategory::ALL
            .iter()
            .map(|c| record.lifetime_count(*c) as f64 * cfg.for_category(*c).empathy_weight)
            .sum();
        record.historical_engagement_score = streak_component + activity_component;
    }
}

fn build_summary(records: &[UserScoreRecord], now: DateTime<Utc>, cfg: &PointsConfig) -> CohortSummary {
    let mut summary = CohortSummary::new();

    for category in InteractionCategory::ALL {
        let mut qualified = std::collections::BTreeSet::new();
        let mut non_qualified: Vec<&UserScoreRecord> = Vec::new();

        for record in records {
            if qualifies(record, category, now, cfg) {
                qualified.insert(record.user_id.clone());
            } else {
                non_qualified.push(record);
            }
        }

        let mut eligible: Vec<&UserScoreRecord> = non_qualified
            .into_iter()
            .filter(|r| r.historical_engagement_score > 0.0)
            .collect();
        eligible.sort_by(|a, b| {
            b.historical_engagement_score
                .partial_cmp(&a.historical_engagement_score)
                .unwrap()
                .then_with(|| a.user_id.cmp(&b.user_id))
        });

        let take_n = (0.10 * eligible.len() as f64).ceil() as usize;
        let empathy = eligible
            .into_iter()
            .take(take_n)
            .map(|r| r.user_id.clone())
            .collect();

        summary.insert(category, CategoryCohort { qualified, empathy });
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::db::SqliteScoreStore;
    use rusqlite::Connection;

    fn push_n(record: &mut UserScoreRecord, category: InteractionCategory, n: usize, now: DateTime<Utc>) {
        for _ in 0..n {
            record.timestamps.get_mut(&category).unwrap().push(now);
        }
    }

    #[tokio::test]
    async fn qualifies_full_participant_and_selects_empathy_cohort() {
        let store: Arc<dyn ScoreStore> =
            Arc::new(SqliteScoreStore::new(Connection::open_in_memory().unwrap()).unwrap());
        let cfg = PointsConfig::default();
        let now = Utc::now();
        let today = now.date_naive();

        // User A: fully qualifies in all six categories today.
        store
            .upsert_atomic(
                "A",
                today,
                Box::new(move |record| {
                    push_n(record, InteractionCategory::Post, 2, now);
                    push_n(record, InteractionCategory::Like, 5, now);
                    push_n(record, InteractionCategory::Comment, 5, now);
                    push_n(record, InteractionCategory::Crypto, 3, now);
                    push_n(record, InteractionCategory::Tip, 1, now);
                    push_n(record, InteractionCategory::Referral, 1, now);
                    crate::db::ApplyOutcome::Accepted {
                        delta: 0.0,
                        normalized_score: 0.0,
                    }
                }),
            )
            .await
            .unwrap();

        // User B: one post only, prior streak of 7.
        store
            .upsert_atomic(
                "B",
                today,
                Box::new(move |record| {
                    push_n(record, InteractionCategory::Post, 1, now);
                    record.consecutive_activity_days = 7;
                    crate::db::ApplyOutcome::Accepted {
                        delta: 0.0,
                        normalized_score: 0.0,
                    }
                }),
            )
            .await
            .unwrap();

        // User C: never interacted, but has a ledger row.
        store
            .upsert_atomic(
                "C",
                today,
                Box::new(|_record| crate::db::ApplyOutcome::Accepted {
                    delta: 0.0,
                    normalized_score: 0.0,
                }),
            )
            .await
            .unwrap();

        let engine = CohortEngine::new(Arc::clone(&store), cfg);
        let summary = engine.run().await.unwrap();

        let posts = &summary[&InteractionCategory::Post];
        assert!(posts.qualified.contains("A"));
        assert!(!posts.qualified.contains("B"));
        assert_eq!(posts.empathy, ["B".to_string()].into_iter().collect());
        assert!(!posts.empathy.contains("C"));

        let a_record = store.get("A").await.unwrap().unwrap();
        assert_eq!(a_record.consecutive_activity_days, 1);
        assert_eq!(a_record.historical_engagement_score, 0.0);

        let b_record = store.get("B").await.unwrap().unwrap();
        assert_eq!(b_record.consecutive_activity_days, 0);
        assert!((b_record.historical_engagement_score - 3.75).abs() < 1e-9);
    }

    #[tokio::test]
    async fn partial_qualifier_keeps_streak_but_still_gets_a_historical_score() {
        let store: Arc<dyn ScoreStore> =
            Arc::new(SqliteScoreStore::new(Connection::open_in_memory().unwrap()).unwrap());
        let cfg = PointsConfig::default();
        let now = Utc::now();
        let today = now.date_naive();

        // User D: qualifies for likes (5/5) but not posts, comments, crypto,
        // tip, or referral today — active, but not a full qualifier.
        store
            .upsert_atomic(
                "D",
                today,
                Box::new(move |record| {
                    push_n(record, InteractionCategory::Like, 5, now);
                    record.consecutive_activity_days = 2;
                    crate::db::ApplyOutcome::Accepted {
                        delta: 0.0,
                        normalized_score: 0.0,
                    }
                }),
            )
            .await
            .unwrap();

        let engine = CohortEngine::new(Arc::clone(&store), cfg.clone());
        let summary = engine.run().await.unwrap();

        let d_record = store.get("D").await.unwrap().unwrap();
        // Active today (qualified for likes), so the streak still increments...
        assert_eq!(d_record.consecutive_activity_days, 3);
        // ...but since D didn't qualify in all six categories, the historical
        // score is still computed rather than zeroed, using the pre-reset
        // streak (2) plus lifetime activity.
        let expected = 2.0 * cfg.streak_weight + 5.0 * cfg.like.empathy_weight;
        assert!((d_record.historical_engagement_score - expected).abs() < 1e-9);
        assert!(d_record.historical_engagement_score > 0.0);

        // D is a non-qualifier for posts with a nonzero score, so D is
        // eligible for the posts empathy cohort.
        let posts = &summary[&InteractionCategory::Post];
        assert!(!posts.qualified.contains("D"));
        assert!(posts.empathy.contains("D"));
    }

    #[tokio::test]
    async fn concurrent_run_is_rejected_while_lock_held() {
        let store: Arc<dyn ScoreStore> =
            Arc::new(SqliteScoreStore::new(Connection::open_in_memory().unwrap()).unwrap());
        assert!(store.try_acquire_cohort_lock().await.unwrap());
        assert!(!store.try_acquire_cohort_lock().await.unwrap());
        store.release_cohort_lock().await.unwrap();
        assert!(store.try_acquire_cohort_lock().await.unwrap());
    }
}
