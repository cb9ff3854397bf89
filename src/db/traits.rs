// Score store trait — backend-agnostic async interface for the C2 ledger.
//
// Implementors: SqliteScoreStore (rusqlite), PgScoreStore (sqlx, `postgres`
// feature). All methods are async so both the sync (rusqlite via Mutex) and
// native async (sqlx) backends fit behind a single interface.
//
// Atomicity is expressed as two concrete (non-generic) read-modify-write
// entry points rather than one generic `upsert_atomic<T>`, so `dyn
// ScoreStore` stays object-safe: `upsert_atomic` is for C7's point-awarding
// operations (its mutator decides and returns an `ApplyOutcome`);
// `cohort_update` is for C10's once-daily streak/historical-score pass (its
// mutator only mutates; the caller derives cohort membership from the
// returned post-mutation record).

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use super::models::{ApplyOutcome, PostAward, UserScoreRecord};

#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Fetch a user's record, or `None` if they have never interacted.
    async fn get(&self, user_id: &str) -> Result<Option<UserScoreRecord>>;

    /// Atomic read-modify-write under a per-row lock. First evaluates
    /// month-reset (crossing a new calendar month zeroes the six point
    /// totals and one-time fields before the mutator runs), then calls
    /// `mutator`, persists the result, and returns the mutator's decision.
    async fn upsert_atomic(
        &self,
        user_id: &str,
        today: NaiveDate,
        mutator: Box<dyn FnOnce(&mut UserScoreRecord) -> ApplyOutcome + Send>,
    ) -> Result<ApplyOutcome>;

    /// Atomic read-modify-write for the daily cohort pass. Evaluates
    /// month-reset, invokes `mutator` to update streak/historical score,
    /// persists, and returns the full post-mutation record.
    async fn cohort_update(
        &self,
        user_id: &str,
        today: NaiveDate,
        mutator: Box<dyn FnOnce(&mut UserScoreRecord) + Send>,
    ) -> Result<UserScoreRecord>;

    /// Every user id with a ledger row. Used by C10 to drive the daily pass.
    async fn all_user_ids(&self) -> Result<Vec<String>>;

    /// Snapshot every record. Used by admin summary endpoints.
    async fn scan_all(&self) -> Result<Vec<UserScoreRecord>>;

    /// Record the delta awarded for a post, so it can be refunded exactly
    /// on delete.
    async fn save_post_award(&self, award: &PostAward) -> Result<()>;

    /// Remove and return the sidecar award row for a post, if any.
    async fn take_post_award(&self, post_id: &str) -> Result<Option<PostAward>>;

    /// Single-instance lock for C10 — fails (`Ok(false)`) if already held.
    async fn try_acquire_cohort_lock(&self) -> Result<bool>;

    /// Release the lock acquired by `try_acquire_cohort_lock`.
    async fn release_cohort_lock(&self) -> Result<()>;
}
