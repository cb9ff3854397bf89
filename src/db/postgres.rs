// PgScoreStore — sqlx backend implementing the ScoreStore trait.
//
// Row-level atomicity is expressed with `SELECT ... FOR UPDATE` inside a
// transaction rather than a single-process mutex, since multiple instances
// of this service can share one Postgres database. Mirrors the shape of
// `SqliteScoreStore` so callers never need to know which backend is live.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx_core::pool::Pool;
use sqlx_core::row::Row;
use sqlx_postgres::Postgres;

use super::models::{ApplyOutcome, PostAward, UserScoreRecord};
use super::traits::ScoreStore;

/// Type alias for the PostgreSQL connection pool (mirrors the `sqlx` facade's
/// `PgPool` without pulling in the umbrella crate).
pub type PgPool = Pool<Postgres>;
type PgTransaction<'a> = sqlx_core::transaction::Transaction<'a, Postgres>;

pub struct PgScoreStore {
    pool: PgPool,
}

impl PgScoreStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .context("Failed to connect to Postgres score store")?;

        sqlx_core::query::query(
            "CREATE TABLE IF NOT EXISTS user_scores (
                user_id TEXT PRIMARY KEY,
                data JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&pool)
        .await?;

        sqlx_core::query::query(
            "CREATE TABLE IF NOT EXISTS post_awards (
                post_id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                awarded_delta DOUBLE PRECISION NOT NULL,
                awarded_at TIMESTAMPTZ NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        sqlx_core::query::query(
            "CREATE TABLE IF NOT EXISTS cohort_lock (
                id INTEGER PRIMARY KEY,
                held BOOLEAN NOT NULL DEFAULT false
            )",
        )
        .execute(&pool)
        .await?;

        sqlx_core::query::query(
            "INSERT INTO cohort_lock (id, held) VALUES (1, false) ON CONFLICT DO NOTHING",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    async fn load_or_create(
        tx: &mut PgTransaction<'_>,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<UserScoreRecord> {
        let row = sqlx_core::query::query("SELECT data FROM user_scores WHERE user_id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await?;

        match row {
            Some(row) => {
                let data: serde_json::Value = row.try_get("data")?;
                Ok(serde_json::from_value(data)?)
            }
            None => Ok(UserScoreRecord::new(user_id, today)),
        }
    }

    async fn save(tx: &mut PgTransaction<'_>, record: &UserScoreRecord) -> Result<()> {
        let data = serde_json::to_value(record)?;
        sqlx_core::query::query(
            "INSERT INTO user_scores (user_id, data, updated_at) VALUES ($1, $2, now())
             ON CONFLICT (user_id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
        )
        .bind(&record.user_id)
        .bind(data)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ScoreStore for PgScoreStore {
    async fn get(&self, user_id: &str) -> Result<Option<UserScoreRecord>> {
        let row = sqlx_core::query::query("SELECT data FROM user_scores WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let data: serde_json::Value = row.try_get("data")?;
                Ok(Some(serde_json::from_value(data)?))
            }
            None => Ok(None),
        }
    }

    async fn upsert_atomic(
        &self,
        user_id: &str,
        today: NaiveDate,
        mutator: Box<dyn FnOnce(&mut UserScoreRecord) -> ApplyOutcome + Send>,
    ) -> Result<ApplyOutcome> {
        let mut tx = self.pool.begin().await?;
        let mut record = Self::load_or_create(&mut tx, user_id, today).await?;
        record.apply_month_reset_if_due(today);
        let outcome = mutator(&mut record);
        Self::save(&mut tx, &record).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    async fn cohort_update(
        &self,
        user_id: &str,
        today: NaiveDate,
        mutator: Box<dyn FnOnce(&mut UserScoreRecord) + Send>,
    ) -> Result<UserScoreRecord> {
        let mut tx = self.pool.begin().await?;
        let mut record = Self::load_or_create(&mut tx, user_id, today).await?;
        record.apply_month_reset_if_due(today);
        mutator(&mut record);
        Self::save(&mut tx, &record).await?;
        tx.commit().await?;
        Ok(record)
    }

    async fn all_user_ids(&self) -> Result<Vec<String>> {
        let rows = sqlx_core::query::query("SELECT user_id FROM user_scores ORDER BY user_id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|r| Ok(r.try_get("user_id")?)).collect()
    }

    async fn scan_all(&self) -> Result<Vec<UserScoreRecord>> {
        let rows = sqlx_core::query::query("SELECT data FROM user_scores ORDER BY user_id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|r| {
                let data: serde_json::Value = r.try_get("data")?;
                Ok(serde_json::from_value(data)?)
            })
            .collect()
    }

    async fn save_post_award(&self, award: &PostAward) -> Result<()> {
        sqlx_core::query::query(
            "INSERT INTO post_awards (post_id, user_id, awarded_delta, awarded_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (post_id) DO UPDATE SET
                user_id = excluded.user_id,
                awarded_delta = excluded.awarded_delta,
                awarded_at = excluded.awarded_at",
        )
        .bind(&award.post_id)
        .bind(&award.user_id)
        .bind(award.awarded_delta)
        .bind(award.awarded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn take_post_award(&self, post_id: &str) -> Result<Option<PostAward>> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx_core::query::query(
            "SELECT user_id, awarded_delta, awarded_at FROM post_awards WHERE post_id = $1",
        )
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.commit().await?;
            return Ok(None);
        };

        let award = PostAward {
            post_id: post_id.to_string(),
            user_id: row.try_get("user_id")?,
            awarded_delta: row.try_get("awarded_delta")?,
            awarded_at: row.try_get("awarded_at")?,
        };

        sqlx_core::query::query("DELETE FROM post_awards WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(award))
    }

    async fn try_acquire_cohort_lock(&self) -> Result<bool> {
        let result =
            sqlx_core::query::query("UPDATE cohort_lock SET held = true WHERE id = 1 AND held = false")
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn release_cohort_lock(&self) -> Result<()> {
        sqlx_core::query::query("UPDATE cohort_lock SET held = false WHERE id = 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[allow(dead_code)]
fn _assert_send_sync()
where
    PgScoreStore: Send + Sync,
{
}
