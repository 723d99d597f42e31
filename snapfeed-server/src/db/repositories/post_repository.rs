use rusqlite::{params, OptionalExtension, Row};

use snapfeed_types::{NewPost, Post, PostId, UserId};

use super::{format_timestamp, now, parse_timestamp};
use crate::db::{DbPool, StoreResult};

const POST_COLUMNS: &str = "id, user_id, image_url, caption, location, created_at";

pub struct PostRepository {
    pool: DbPool,
}

impl PostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &Row) -> rusqlite::Result<Post> {
        Ok(Post {
            id: row.get(0)?,
            user_id: row.get(1)?,
            image_url: row.get(2)?,
            caption: row.get(3)?,
            location: row.get(4)?,
            created_at: parse_timestamp(5, row.get(5)?)?,
        })
    }

    /// Create a new post stamped with the current time
    pub fn create(&self, post: NewPost) -> StoreResult<Post> {
        let conn = self.pool.get()?;
        let created_at = now();
        conn.execute(
            "INSERT INTO posts (user_id, image_url, caption, location, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                post.user_id,
                post.image_url,
                post.caption,
                post.location,
                format_timestamp(&created_at),
            ],
        )?;

        Ok(Post {
            id: conn.last_insert_rowid(),
            user_id: post.user_id,
            image_url: post.image_url,
            caption: post.caption,
            location: post.location,
            created_at,
        })
    }

    /// Get post by ID
    pub fn get_by_id(&self, post_id: PostId) -> StoreResult<Option<Post>> {
        let conn = self.pool.get()?;
        let post = conn
            .query_row(
                &format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS),
                [post_id],
                Self::from_row,
            )
            .optional()?;
        Ok(post)
    }

    /// All posts, newest first
    pub fn get_all(&self) -> StoreResult<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM posts ORDER BY created_at DESC, id DESC",
            POST_COLUMNS
        ))?;

        let posts = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// Posts by a specific user, newest first
    pub fn get_by_user(&self, user_id: UserId) -> StoreResult<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM posts WHERE user_id = ? ORDER BY created_at DESC, id DESC",
            POST_COLUMNS
        ))?;

        let posts = stmt
            .query_map([user_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    pub fn count_by_user(&self, user_id: UserId) -> StoreResult<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE user_id = ?",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Delete a post with its likes and comments in one transaction
    pub fn delete(&self, post_id: PostId) -> StoreResult<bool> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let deleted = tx.execute("DELETE FROM posts WHERE id = ?", [post_id])?;
        if deleted == 0 {
            return Ok(false);
        }
        let likes = tx.execute("DELETE FROM likes WHERE post_id = ?", [post_id])?;
        let comments = tx.execute("DELETE FROM comments WHERE post_id = ?", [post_id])?;
        tx.commit()?;

        tracing::debug!(
            "Deleted post {} with {} likes and {} comments",
            post_id,
            likes,
            comments
        );
        Ok(true)
    }
}
