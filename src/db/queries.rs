// Synchronous rusqlite query functions. Kept separate from the trait/async
// layer so they're easy to unit test directly against a `Connection`.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use super::models::{PostAward, UserScoreRecord};

pub fn get_user(conn: &rusqlite::Connection, user_id: &str) -> Result<Option<UserScoreRecord>> {
    let json: Option<String> = conn
        .query_row(
            "SELECT data FROM user_scores WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()
        .context("Failed to load user score record")?;

    match json {
        Some(data) => Ok(Some(
            serde_json::from_str(&data).context("Failed to deserialize user score record")?,
        )),
        None => Ok(None),
    }
}

pub fn save_user(conn: &rusqlite::Connection, record: &UserScoreRecord) -> Result<()> {
    let json = serde_json::to_string(record).context("Failed to serialize user score record")?;
    conn.execute(
        "INSERT INTO user_scores (user_id, data, updated_at) VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(user_id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
        params![record.user_id, json],
    )
    .context("Failed to persist user score record")?;
    Ok(())
}

pub fn all_user_ids(conn: &rusqlite::Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT user_id FROM user_scores ORDER BY user_id")?;
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(ids)
}

pub fn scan_all(conn: &rusqlite::Connection) -> Result<Vec<UserScoreRecord>> {
    let mut stmt = conn.prepare("SELECT data FROM user_scores ORDER BY user_id")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter()
        .map(|json| serde_json::from_str(&json).context("Failed to deserialize user score record"))
        .collect()
}

pub fn save_post_award(conn: &rusqlite::Connection, award: &PostAward) -> Result<()> {
    conn.execute(
        "INSERT INTO post_awards (post_id, user_id, awarded_delta, awarded_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(post_id) DO UPDATE SET
            user_id = excluded.user_id,
            awarded_delta = excluded.awarded_delta,
            awarded_at = excluded.awarded_at",
        params![
            award.post_id,
            award.user_id,
            award.awarded_delta,
            award.awarded_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn take_post_award(conn: &rusqlite::Connection, post_id: &str) -> Result<Option<PostAward>> {
    let row: Option<(String, f64, String)> = conn
        .query_row(
            "SELECT user_id, awarded_delta, awarded_at FROM post_awards WHERE post_id = ?1",
            params![post_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    let Some((user_id, awarded_delta, awarded_at)) = row else {
        return Ok(None);
    };

    conn.execute(
        "DELETE FROM post_awards WHERE post_id = ?1",
        params![post_id],
    )?;

    Ok(Some(PostAward {
        post_id: post_id.to_string(),
        user_id,
        awarded_delta,
        awarded_at: chrono::DateTime::parse_from_rfc3339(&awarded_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    }))
}

pub fn try_acquire_cohort_lock(conn: &rusqlite::Connection) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE cohort_lock SET held = 1 WHERE id = 1 AND held = 0",
        [],
    )?;
    Ok(changed == 1)
}

pub fn release_cohort_lock(conn: &rusqlite::Connection) -> Result<()> {
    conn.execute("UPDATE cohort_lock SET held = 0 WHERE id = 1", [])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;
    use chrono::NaiveDate;

    fn setup() -> rusqlite::Connection {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    #[test]
    fn get_absent_user_returns_none() {
        let conn = setup();
        assert!(get_user(&conn, "nobody").unwrap().is_none());
    }

    #[test]
    fn save_then_get_round_trips() {
        let conn = setup();
        let today = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let record = UserScoreRecord::new("u1", today);
        save_user(&conn, &record).unwrap();
        let loaded = get_user(&conn, "u1").unwrap().unwrap();
        assert_eq!(loaded.user_id, "u1");
    }

    #[test]
    fn cohort_lock_is_exclusive() {
        let conn = setup();
        assert!(try_acquire_cohort_lock(&conn).unwrap());
        assert!(!try_acquire_cohort_lock(&conn).unwrap());
        release_cohort_lock(&conn).unwrap();
        assert!(try_acquire_cohort_lock(&conn).unwrap());
    }

    #[test]
    fn post_award_round_trips_and_is_removed_on_take() {
        let conn = setup();
        let award = PostAward {
            post_id: "p1".to_string(),
            user_id: "u1".to_string(),
            awarded_delta: 1.55,
            awarded_at: Utc::now(),
        };
        save_post_award(&conn, &award).unwrap();
        let taken = take_post_award(&conn, "p1").unwrap().unwrap();
        assert_eq!(taken.user_id, "u1");
        assert!((taken.awarded_delta - 1.55).abs() < 1e-9);
        assert!(take_post_award(&conn, "p1").unwrap().is_none());
    }
}
