// SQLite schema — table creation and migrations.
//
// A `schema_version` table tracks which migrations have run; each migration
// is a function executing SQL statements, applied in order up to the
// current version.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet. Idempotent — safe on every
/// startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- One row per user. The record is stored as a JSON blob — its shape
        -- (six categories, timestamp histories, one-time events) evolves
        -- without needing a migration per field.
        CREATE TABLE IF NOT EXISTS user_scores (
            user_id TEXT PRIMARY KEY,
            data TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Sidecar table mapping an awarded post back to its delta, so
        -- delete_post can refund exactly what was granted.
        CREATE TABLE IF NOT EXISTS post_awards (
            post_id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            awarded_delta REAL NOT NULL,
            awarded_at TEXT NOT NULL
        );

        -- Single-row advisory lock so the cohort engine (C10) never runs
        -- concurrently with itself.
        CREATE TABLE IF NOT EXISTS cohort_lock (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            held INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_post_awards_user
            ON post_awards(user_id);
        ",
    )
    .context("Failed to create score-store tables")?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO cohort_lock (id, held) VALUES (1, 0)",
        [],
    )?;

    Ok(())
}

pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
