// Data models — Rust structs that map to score-store rows.
//
// Kept separate from the query/trait layer so other modules (C7, C10) can
// use them without depending on rusqlite or sqlx directly.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::categories::InteractionCategory;

/// Per-user ledger row. Created on first interaction; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserScoreRecord {
    pub user_id: String,
    /// Per-category point totals. Never exceeds the category's monthly cap;
    /// never decreases except at month reset.
    pub points: BTreeMap<InteractionCategory, f64>,
    /// Per-category accepted-interaction timestamps, oldest first.
    pub timestamps: BTreeMap<InteractionCategory, Vec<DateTime<Utc>>>,
    pub one_time_points: f64,
    pub one_time_events: HashSet<String>,
    pub last_reset_date: NaiveDate,
    pub last_active_date: Option<NaiveDate>,
    pub consecutive_activity_days: u32,
    pub historical_engagement_score: f64,
}

impl UserScoreRecord {
    /// A brand-new record for a user who has never interacted before.
    pub fn new(user_id: impl Into<String>, today: NaiveDate) -> Self {
        let mut points = BTreeMap::new();
        let mut timestamps = BTreeMap::new();
        for category in InteractionCategory::ALL {
            points.insert(category, 0.0);
            timestamps.insert(category, Vec::new());
        }
        Self {
            user_id: user_id.into(),
            points,
            timestamps,
            one_time_points: 0.0,
            one_time_events: HashSet::new(),
            last_reset_date: today,
            last_active_date: None,
            consecutive_activity_days: 0,
            historical_engagement_score: 0.0,
        }
    }

    pub fn points_for(&self, category: InteractionCategory) -> f64 {
        *self.points.get(&category).unwrap_or(&0.0)
    }

    pub fn timestamps_for(&self, category: InteractionCategory) -> &[DateTime<Utc>] {
        self.timestamps
            .get(&category)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Count of accepted interactions in `category` within the last 24h.
    pub fn count_last_24h(&self, category: InteractionCategory, now: DateTime<Utc>) -> usize {
        let cutoff = now - chrono::Duration::hours(24);
        self.timestamps_for(category)
            .iter()
            .filter(|ts| **ts >= cutoff)
            .count()
    }

    /// Lifetime count of accepted interactions in `category`.
    pub fn lifetime_count(&self, category: InteractionCategory) -> usize {
        self.timestamps_for(category).len()
    }

    pub fn sum_of_six_totals(&self) -> f64 {
        InteractionCategory::ALL
            .iter()
            .map(|c| self.points_for(*c))
            .sum()
    }

    /// Month-reset check: crossing a new calendar month zeroes the six
    /// point totals and one-time fields, but preserves timestamp history
    /// and streak. Tied to the record's own `last_reset_date`, so offline
    /// users are reset on their next interaction, not a global timer.
    pub fn apply_month_reset_if_due(&mut self, today: NaiveDate) {
        if today.year_month() != self.last_reset_date.year_month() {
            for category in InteractionCategory::ALL {
                self.points.insert(category, 0.0);
            }
            self.one_time_points = 0.0;
            self.one_time_events.clear();
            self.last_reset_date = today;
        }
    }
}

trait YearMonth {
    fn year_month(&self) -> (i32, u32);
}

impl YearMonth for NaiveDate {
    fn year_month(&self) -> (i32, u32) {
        use chrono::Datelike;
        (self.year(), self.month())
    }
}

/// Side-table entry mapping an awarded post back to the delta it earned, so
/// `delete_post` can refund exactly what was granted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostAward {
    pub post_id: String,
    pub user_id: String,
    pub awarded_delta: f64,
    pub awarded_at: DateTime<Utc>,
}

/// The result of a single C7 `apply` call.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Accepted {
        delta: f64,
        normalized_score: f64,
    },
    Limited {
        current_score: f64,
    },
    Capped {
        current_score: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_has_zeroed_categories() {
        let today = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let rec = UserScoreRecord::new("u1", today);
        for c in InteractionCategory::ALL {
            assert_eq!(rec.points_for(c), 0.0);
            assert!(rec.timestamps_for(c).is_empty());
        }
    }

    #[test]
    fn month_reset_zeroes_points_but_keeps_timestamps() {
        let jan = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let feb = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let mut rec = UserScoreRecord::new("u1", jan);
        rec.points.insert(InteractionCategory::Like, 5.0);
        rec.timestamps
            .get_mut(&InteractionCategory::Like)
            .unwrap()
            .push(Utc::now());
        rec.one_time_points = 10.0;
        rec.one_time_events.insert("SIGNUP".to_string());

        rec.apply_month_reset_if_due(feb);

        assert_eq!(rec.points_for(InteractionCategory::Like), 0.0);
        assert_eq!(rec.timestamps_for(InteractionCategory::Like).len(), 1);
        assert_eq!(rec.one_time_points, 0.0);
        assert!(rec.one_time_events.is_empty());
        assert_eq!(rec.last_reset_date, feb);
    }

    #[test]
    fn no_reset_within_same_month() {
        let d1 = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let mut rec = UserScoreRecord::new("u1", d1);
        rec.points.insert(InteractionCategory::Post, 2.0);
        rec.apply_month_reset_if_due(d2);
        assert_eq!(rec.points_for(InteractionCategory::Post), 2.0);
    }
}
