// SqliteContentIndex — brute-force cosine nearest-neighbour over vectors
// persisted in sqlite. Adequate at moderate scale; the `ContentIndex` trait
// keeps the real vector-store choice swappable later.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;

use super::encoder::{cosine_distance, TextEncoder};
use super::models::{DeleteOutcome, NearestMatch, Post};
use super::traits::ContentIndex;

pub struct SqliteContentIndex {
    conn: Mutex<Connection>,
    encoder: Arc<dyn TextEncoder>,
}

impl SqliteContentIndex {
    pub fn open(path: &str, encoder: Arc<dyn TextEncoder>) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open content index at {path}"))?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            encoder,
        })
    }

    pub fn new(conn: Connection, encoder: Arc<dyn TextEncoder>) -> Result<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            encoder,
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS posts (
                post_id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                content TEXT NOT NULL,
                has_image INTEGER NOT NULL DEFAULT 0,
                vector TEXT NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_posts_user ON posts(user_id);",
        )
        .context("Failed to create content index schema")?;
        Ok(())
    }
}

#[async_trait]
impl ContentIndex for SqliteContentIndex {
    async fn insert(&self, post: &Post) -> Result<()> {
        let conn = self.conn.lock().await;

        let exists: bool = conn
            .query_row(
                "SELECT 1 FROM posts WHERE post_id = ?1",
                params![post.post_id],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if exists {
            anyhow::bail!("post_id conflict: {}", post.post_id);
        }

        let vector = self.encoder.encode(&post.content, post.image.as_deref());
        let vector_json = serde_json::to_string(&vector)?;

        conn.execute(
            "INSERT INTO posts (post_id, user_id, content, has_image, vector)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                post.post_id,
                post.user_id,
                post.content,
                post.image.is_some() as i64,
                vector_json,
            ],
        )?;
        Ok(())
    }

    async fn nearest(&self, text: &str, image: Option<&[u8]>) -> Result<Option<NearestMatch>> {
        let conn = self.conn.lock().await;
        let query_vec = self.encoder.encode(text, image);

        let mut stmt = conn.prepare("SELECT post_id, vector FROM posts")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut best: Option<NearestMatch> = None;
        for (post_id, vector_json) in rows {
            let vector: Vec<f64> = serde_json::from_str(&vector_json)?;
            let distance = cosine_distance(&query_vec, &vector);
            if best.as_ref().map(|b| distance < b.distance).unwrap_or(true) {
                best = Some(NearestMatch {
                    distance,
                    matched_post_id: post_id,
                });
            }
        }

        Ok(best)
    }

    async fn delete(&self, post_id: &str, user_id: &str) -> Result<DeleteOutcome> {
        let conn = self.conn.lock().await;
        let owner: Option<String> = conn
            .query_row(
                "SELECT user_id FROM posts WHERE post_id = ?1",
                params![post_id],
                |row| row.get(0),
            )
            .optional()?;

        match owner {
            None => Ok(DeleteOutcome::NotFound),
            Some(owner) if owner != user_id => Ok(DeleteOutcome::UserMismatch),
            Some(_) => {
                conn.execute("DELETE FROM posts WHERE post_id = ?1", params![post_id])?;
                Ok(DeleteOutcome::Deleted)
            }
        }
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_index::encoder::HashingEncoder;

    fn memory_index() -> SqliteContentIndex {
        SqliteContentIndex::new(
            Connection::open_in_memory().unwrap(),
            Arc::new(HashingEncoder),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn nearest_on_empty_index_is_none() {
        let index = memory_index();
        assert!(index.nearest("hello world", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_then_nearest_finds_duplicate() {
        let index = memory_index();
        index
            .insert(&Post {
                post_id: "p1".to_string(),
                user_id: "u1".to_string(),
                content: "Thoughtful essay about consensus algorithms.".to_string(),
                image: None,
            })
            .await
            .unwrap();

        let nearest = index
            .nearest("Thoughtful essay about consensus algorithms.", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(nearest.matched_post_id, "p1");
        assert!(nearest.distance < 0.1);
    }

    #[tokio::test]
    async fn duplicate_post_id_is_rejected() {
        let index = memory_index();
        let post = Post {
            post_id: "p1".to_string(),
            user_id: "u1".to_string(),
            content: "hello".to_string(),
            image: None,
        };
        index.insert(&post).await.unwrap();
        assert!(index.insert(&post).await.is_err());
    }

    #[tokio::test]
    async fn delete_requires_matching_user() {
        let index = memory_index();
        index
            .insert(&Post {
                post_id: "p1".to_string(),
                user_id: "u1".to_string(),
                content: "hello".to_string(),
                image: None,
            })
            .await
            .unwrap();

        assert_eq!(
            index.delete("p1", "u2").await.unwrap(),
            DeleteOutcome::UserMismatch
        );
        assert_eq!(
            index.delete("p1", "u1").await.unwrap(),
            DeleteOutcome::Deleted
        );
        assert_eq!(
            index.delete("p1", "u1").await.unwrap(),
            DeleteOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn count_reflects_inserts_and_deletes() {
        let index = memory_index();
        assert_eq!(index.count().await.unwrap(), 0);
        index
            .insert(&Post {
                post_id: "p1".to_string(),
                user_id: "u1".to_string(),
                content: "hello".to_string(),
                image: None,
            })
            .await
            .unwrap();
        assert_eq!(index.count().await.unwrap(), 1);
        index.delete("p1", "u1").await.unwrap();
        assert_eq!(index.count().await.unwrap(), 0);
    }
}
