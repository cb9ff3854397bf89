// Scoring engine (C7) — applies point deltas to the score store under
// daily-limit and monthly-cap rules, and computes the normalized score.
//
// Each public `apply_*` function wraps one `ScoreStore::upsert_atomic` call:
// the closure passed in does the actual limit/cap check and mutation while
// holding the store's per-row lock, so the decision and the write are
// atomic with respect to concurrent interactions from the same user.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};

use crate::config::PointsConfig;
use crate::db::{ApplyOutcome, PostAward, ScoreStore, UserScoreRecord};

use super::categories::InteractionCategory;

/// Normalized score: monthly total / total monthly cap * 100, clamped to
/// [0, 100].
pub fn normalized_score(record: &UserScoreRecord, cfg: &PointsConfig) -> f64 {
    let total = record.sum_of_six_totals();
    ((total / cfg.total_monthly_cap()) * 100.0).clamp(0.0, 100.0)
}

/// Apply a fixed-award interaction (like, comment, referral, tip, crypto).
pub async fn apply_fixed(
    store: &Arc<dyn ScoreStore>,
    user_id: &str,
    category: InteractionCategory,
    today: NaiveDate,
    now: DateTime<Utc>,
    cfg: PointsConfig,
) -> Result<ApplyOutcome> {
    let mutator = Box::new(move |record: &mut UserScoreRecord| {
        apply_fixed_sync(record, category, now, &cfg)
    });
    store.upsert_atomic(user_id, today, mutator).await
}

fn apply_fixed_sync(
    record: &mut UserScoreRecord,
    category: InteractionCategory,
    now: DateTime<Utc>,
    cfg: &PointsConfig,
) -> ApplyOutcome {
    let cat_cfg = cfg.for_category(category);

    let recent = record.count_last_24h(category, now);
    if recent as u32 >= cat_cfg.daily_limit {
        return ApplyOutcome::Limited {
            current_score: normalized_score(record, cfg),
        };
    }

    let current_points = record.points_for(category);
    let delta = cat_cfg.point_value.min(cat_cfg.monthly_cap - current_points);

    if delta <= 0.0 {
        return ApplyOutcome::Capped {
            current_score: normalized_score(record, cfg),
        };
    }

    record.points.insert(category, current_points + delta);
    record
        .timestamps
        .get_mut(&category)
        .expect("every category has a timestamp vec")
        .push(now);
    record.last_active_date = Some(now.date_naive());

    ApplyOutcome::Accepted {
        delta,
        normalized_score: normalized_score(record, cfg),
    }
}

/// Apply a validated post. `quality` is the 0..=10 rating from C5,
/// `originality` is `min(distance, 1.0)` from C6 (or 1.0 when the content
/// index was empty).
#[allow(clippy::too_many_arguments)]
pub async fn apply_post(
    store: &Arc<dyn ScoreStore>,
    user_id: &str,
    post_id: &str,
    quality: u8,
    originality: f64,
    today: NaiveDate,
    now: DateTime<Utc>,
    cfg: PointsConfig,
) -> Result<ApplyOutcome> {
    let post_id_owned = post_id.to_string();
    let user_id_owned = user_id.to_string();
    let mutator = Box::new(move |record: &mut UserScoreRecord| {
        apply_post_sync(record, quality, originality, now, &cfg)
    });
    let outcome = store.upsert_atomic(user_id, today, mutator).await?;

    if let ApplyOutcome::Accepted { delta, .. } = &outcome {
        if *delta > 0.0 {
            store
                .save_post_award(&PostAward {
                    post_id: post_id_owned,
                    user_id: user_id_owned,
                    awarded_delta: *delta,
                    awarded_at: now,
                })
                .await?;
        }
    }

    Ok(outcome)
}

fn apply_post_sync(
    record: &mut UserScoreRecord,
    quality: u8,
    originality: f64,
    now: DateTime<Utc>,
    cfg: &PointsConfig,
) -> ApplyOutcome {
    let category = InteractionCategory::Post;
    let cat_cfg = cfg.for_category(category);

    let recent = record.count_last_24h(category, now);
    if recent as u32 >= cat_cfg.daily_limit {
        return ApplyOutcome::Limited {
            current_score: normalized_score(record, cfg),
        };
    }

    let quality = quality.min(10) as f64;
    let originality = originality.min(1.0);
    let raw_delta =
        cat_cfg.point_value + (quality / 10.0) * cfg.quality_bonus_max + originality * cfg.originality_bonus_max;

    let current_points = record.points_for(category);
    let delta = raw_delta.min(cat_cfg.monthly_cap - current_points).max(0.0);

    if delta <= 0.0 {
        return ApplyOutcome::Capped {
            current_score: normalized_score(record, cfg),
        };
    }

    record.points.insert(category, current_points + delta);
    record
        .timestamps
        .get_mut(&category)
        .expect("post category has a timestamp vec")
        .push(now);
    record.last_active_date = Some(now.date_naive());

    ApplyOutcome::Accepted {
        delta,
        normalized_score: normalized_score(record, cfg),
    }
}

/// Apply a one-time event (e.g. a signup bonus). No-op if `event_id` has
/// already been credited.
pub async fn apply_one_time(
    store: &Arc<dyn ScoreStore>,
    user_id: &str,
    event_id: &str,
    points: f64,
    today: NaiveDate,
    cfg: PointsConfig,
) -> Result<ApplyOutcome> {
    let event_id = event_id.to_string();
    let mutator =
        Box::new(move |record: &mut UserScoreRecord| apply_one_time_sync(record, &event_id, points, &cfg));
    store.upsert_atomic(user_id, today, mutator).await
}

fn apply_one_time_sync(
    record: &mut UserScoreRecord,
    event_id: &str,
    points: f64,
    cfg: &PointsConfig,
) -> ApplyOutcome {
    if record.one_time_events.contains(event_id) {
        return ApplyOutcome::Capped {
            current_score: normalized_score(record, cfg),
        };
    }

    record.one_time_events.insert(event_id.to_string());
    record.one_time_points += points;

    ApplyOutcome::Accepted {
        delta: points,
        normalized_score: normalized_score(record, cfg),
    }
}

/// Refund whatever delta was awarded for `post_id`, subtracting it from the
/// poster's `posts` total and removing the matching timestamp. A missing
/// sidecar award (delta unknown) subtracts 0 and never goes negative.
pub async fn refund_post(store: &Arc<dyn ScoreStore>, post_id: &str) -> Result<Option<f64>> {
    let Some(award) = store.take_post_award(post_id).await? else {
        return Ok(None);
    };

    let delta = award.awarded_delta;
    let today = Utc::now().date_naive();
    let user_id = award.user_id.clone();

    let mutator = Box::new(move |record: &mut UserScoreRecord| {
        refund_post_sync(record, delta);
        ApplyOutcome::Accepted {
            delta: -delta,
            normalized_score: 0.0,
        }
    });
    store.upsert_atomic(&user_id, today, mutator).await?;
    Ok(Some(delta))
}

fn refund_post_sync(record: &mut UserScoreRecord, delta: f64) {
    let category = InteractionCategory::Post;
    let current = record.points_for(category);
    record.points.insert(category, (current - delta).max(0.0));

    if let Some(timestamps) = record.timestamps.get_mut(&category) {
        // Remove the most recent timestamp — the one the awarding call
        // appended — rather than searching for an exact match, since the
        // refund always targets the most recently-awarded post.
        timestamps.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn cfg() -> PointsConfig {
        PointsConfig::default()
    }

    #[test]
    fn five_likes_then_sixth_is_limited() {
        let today = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let mut record = UserScoreRecord::new("u1", today);
        let now = Utc::now();
        let cfg = cfg();

        for _ in 0..5 {
            let outcome = apply_fixed_sync(&mut record, InteractionCategory::Like, now, &cfg);
            assert!(matches!(outcome, ApplyOutcome::Accepted { delta, .. } if (delta - 0.1).abs() < 1e-9));
        }

        let sixth = apply_fixed_sync(&mut record, InteractionCategory::Like, now, &cfg);
        assert!(matches!(sixth, ApplyOutcome::Limited { .. }));

        let score = normalized_score(&record, &cfg);
        assert!((score - (0.5 / 110.0) * 100.0).abs() < 1e-6);
    }

    #[test]
    fn post_with_quality_eight_and_empty_index() {
        let today = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let mut record = UserScoreRecord::new("u2", today);
        let now = Utc::now();
        let cfg = cfg();

        let outcome = apply_post_sync(&mut record, 8, 1.0, now, &cfg);
        match outcome {
            ApplyOutcome::Accepted { delta, .. } => {
                assert!((delta - 1.55).abs() < 1e-9, "expected 1.55, got {delta}");
            }
            other => panic!("expected Accepted, got {other:?}"),
        }
    }

    #[test]
    fn monthly_cap_caps_delta_to_zero() {
        let today = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let mut record = UserScoreRecord::new("u3", today);
        let cfg = cfg();
        record.points.insert(InteractionCategory::Like, 15.0); // at cap

        // Space requests more than 24h apart so the daily limit never
        // triggers before the cap does.
        let now = Utc::now();
        let outcome = apply_fixed_sync(&mut record, InteractionCategory::Like, now, &cfg);
        assert!(matches!(outcome, ApplyOutcome::Capped { .. }));
        assert_eq!(record.points_for(InteractionCategory::Like), 15.0);
    }

    #[test]
    fn one_time_event_awards_once() {
        let today = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let mut record = UserScoreRecord::new("u4", today);
        let cfg = cfg();

        let first = apply_one_time_sync(&mut record, "SIGNUP_BONUS", 5.0, &cfg);
        assert!(matches!(first, ApplyOutcome::Accepted { delta, .. } if delta == 5.0));

        let second = apply_one_time_sync(&mut record, "SIGNUP_BONUS", 5.0, &cfg);
        assert!(matches!(second, ApplyOutcome::Capped { .. }));
        assert_eq!(record.one_time_points, 5.0);
        assert_eq!(record.one_time_events.len(), 1);
    }

    #[test]
    fn daily_limit_resets_after_24_hours() {
        let today = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let mut record = UserScoreRecord::new("u5", today);
        let cfg = cfg();
        let old = Utc::now() - Duration::hours(25);

        for _ in 0..5 {
            record
                .timestamps
                .get_mut(&InteractionCategory::Like)
                .unwrap()
                .push(old);
        }

        let now = Utc::now();
        let outcome = apply_fixed_sync(&mut record, InteractionCategory::Like, now, &cfg);
        assert!(matches!(outcome, ApplyOutcome::Accepted { .. }));
    }
}
