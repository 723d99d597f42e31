use rusqlite::{OptionalExtension, Row};

use snapfeed_types::{Like, NewLike, PostId, UserId};

use crate::db::{DbPool, StoreResult};

pub struct LikeRepository {
    pool: DbPool,
}

impl LikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &Row) -> rusqlite::Result<Like> {
        Ok(Like {
            id: row.get(0)?,
            user_id: row.get(1)?,
            post_id: row.get(2)?,
        })
    }

    /// Insert a like if absent and return the stored row either way
    pub fn insert(&self, like: NewLike) -> StoreResult<Like> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT OR IGNORE INTO likes (user_id, post_id) VALUES (?, ?)",
            [like.user_id, like.post_id],
        )?;

        let stored = conn.query_row(
            "SELECT id, user_id, post_id FROM likes WHERE user_id = ? AND post_id = ?",
            [like.user_id, like.post_id],
            Self::from_row,
        )?;
        Ok(stored)
    }

    pub fn delete(&self, user_id: UserId, post_id: PostId) -> StoreResult<bool> {
        let conn = self.pool.get()?;
        let deleted = conn.execute(
            "DELETE FROM likes WHERE user_id = ? AND post_id = ?",
            [user_id, post_id],
        )?;
        Ok(deleted > 0)
    }

    pub fn get(&self, user_id: UserId, post_id: PostId) -> StoreResult<Option<Like>> {
        let conn = self.pool.get()?;
        let like = conn
            .query_row(
                "SELECT id, user_id, post_id FROM likes WHERE user_id = ? AND post_id = ?",
                [user_id, post_id],
                Self::from_row,
            )
            .optional()?;
        Ok(like)
    }

    pub fn get_by_post(&self, post_id: PostId) -> StoreResult<Vec<Like>> {
        let conn = self.pool.get()?;
        let mut stmt =
            conn.prepare("SELECT id, user_id, post_id FROM likes WHERE post_id = ? ORDER BY id")?;

        let likes = stmt
            .query_map([post_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(likes)
    }

    pub fn count_by_post(&self, post_id: PostId) -> StoreResult<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE post_id = ?",
            [post_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
