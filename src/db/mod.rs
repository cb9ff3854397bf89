// Score store (C2) — durable per-user ledger: per-category point totals,
// per-category daily timestamp lists, streak, historical engagement score,
// and a one-time event log. See `traits::ScoreStore` for the contract.

pub mod models;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod queries;
#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use models::{ApplyOutcome, PostAward, UserScoreRecord};
pub use traits::ScoreStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteScoreStore;

#[cfg(feature = "postgres")]
pub use postgres::PgScoreStore;
