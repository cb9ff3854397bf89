// SqliteScoreStore — rusqlite backend implementing the ScoreStore trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is
// !Send. Trait methods lock the mutex, do synchronous rusqlite work, and
// return. The lock is never held across .await points — Rust enforces this
// because MutexGuard is !Send.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{ApplyOutcome, PostAward, UserScoreRecord};
use super::traits::ScoreStore;
use super::{queries, schema};

pub struct SqliteScoreStore {
    conn: Mutex<Connection>,
}

impl SqliteScoreStore {
    /// Open (creating if absent) a sqlite database at `path` and run schema
    /// migrations.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open score store at {path}"))?;
        schema::create_tables(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Wrap an already-opened connection (used by tests for `:memory:`).
    pub fn new(conn: Connection) -> Result<Self> {
        schema::create_tables(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn load_or_create(conn: &Connection, user_id: &str, today: NaiveDate) -> Result<UserScoreRecord> {
        match queries::get_user(conn, user_id)? {
            Some(record) => Ok(record),
            None => Ok(UserScoreRecord::new(user_id, today)),
        }
    }
}

#[async_trait]
impl ScoreStore for SqliteScoreStore {
    async fn get(&self, user_id: &str) -> Result<Option<UserScoreRecord>> {
        let conn = self.conn.lock().await;
        queries::get_user(&conn, user_id)
    }

    async fn upsert_atomic(
        &self,
        user_id: &str,
        today: NaiveDate,
        mutator: Box<dyn FnOnce(&mut UserScoreRecord) -> ApplyOutcome + Send>,
    ) -> Result<ApplyOutcome> {
        let conn = self.conn.lock().await;
        let mut record = Self::load_or_create(&conn, user_id, today)?;
        record.apply_month_reset_if_due(today);
        let outcome = mutator(&mut record);
        queries::save_user(&conn, &record)?;
        Ok(outcome)
    }

    async fn cohort_update(
        &self,
        user_id: &str,
        today: NaiveDate,
        mutator: Box<dyn FnOnce(&mut UserScoreRecord) + Send>,
    ) -> Result<UserScoreRecord> {
        let conn = self.conn.lock().await;
        let mut record = Self::load_or_create(&conn, user_id, today)?;
        record.apply_month_reset_if_due(today);
        mutator(&mut record);
        queries::save_user(&conn, &record)?;
        Ok(record)
    }

    async fn all_user_ids(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().await;
        queries::all_user_ids(&conn)
    }

    async fn scan_all(&self) -> Result<Vec<UserScoreRecord>> {
        let conn = self.conn.lock().await;
        queries::scan_all(&conn)
    }

    async fn save_post_award(&self, award: &PostAward) -> Result<()> {
        let conn = self.conn.lock().await;
        queries::save_post_award(&conn, award)
    }

    async fn take_post_award(&self, post_id: &str) -> Result<Option<PostAward>> {
        let conn = self.conn.lock().await;
        queries::take_post_award(&conn, post_id)
    }

    async fn try_acquire_cohort_lock(&self) -> Result<bool> {
        let conn = self.conn.lock().await;
        queries::try_acquire_cohort_lock(&conn)
    }

    async fn release_cohort_lock(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        queries::release_cohort_lock(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::categories::InteractionCategory;

    fn memory_store() -> SqliteScoreStore {
        SqliteScoreStore::new(Connection::open_in_memory().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn upsert_atomic_persists_mutation() {
        let store = memory_store();
        let today = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();

        let outcome = store
            .upsert_atomic(
                "u1",
                today,
                Box::new(|record| {
                    record
                        .points
                        .insert(InteractionCategory::Like, 0.1);
                    record
                        .timestamps
                        .get_mut(&InteractionCategory::Like)
                        .unwrap()
                        .push(Utc::now());
                    ApplyOutcome::Accepted {
                        delta: 0.1,
                        normalized_score: 0.0909,
                    }
                }),
            )
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ApplyOutcome::Accepted {
                delta: 0.1,
                normalized_score: 0.0909
            }
        );

        let record = store.get("u1").await.unwrap().unwrap();
        assert_eq!(record.points_for(InteractionCategory::Like), 0.1);
    }

    #[tokio::test]
    async fn post_award_round_trips_through_store() {
        let store = memory_store();
        let award = PostAward {
            post_id: "p1".to_string(),
            user_id: "u1".to_string(),
            awarded_delta: 1.55,
            awarded_at: Utc::now(),
        };
        store.save_post_award(&award).await.unwrap();
        let taken = store.take_post_award("p1").await.unwrap().unwrap();
        assert_eq!(taken.user_id, "u1");
        assert!(store.take_post_award("p1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cohort_lock_is_single_instance() {
        let store = memory_store();
        assert!(store.try_acquire_cohort_lock().await.unwrap());
        assert!(!store.try_acquire_cohort_lock().await.unwrap());
        store.release_cohort_lock().await.unwrap();
        assert!(store.try_acquire_cohort_lock().await.unwrap());
    }
}
