use rusqlite::{params, OptionalExtension, Row};

use snapfeed_types::{Comment, CommentId, NewComment, PostId};

use super::{format_timestamp, now, parse_timestamp};
use crate::db::{DbPool, StoreResult};

pub struct CommentRepository {
    pool: DbPool,
}

impl CommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &Row) -> rusqlite::Result<Comment> {
        Ok(Comment {
            id: row.get(0)?,
            user_id: row.get(1)?,
            post_id: row.get(2)?,
            content: row.get(3)?,
            created_at: parse_timestamp(4, row.get(4)?)?,
        })
    }

    pub fn create(&self, comment: NewComment) -> StoreResult<Comment> {
        let conn = self.pool.get()?;
        let created_at = now();
        conn.execute(
            "INSERT INTO comments (user_id, post_id, content, created_at) VALUES (?, ?, ?, ?)",
            params![
                comment.user_id,
                comment.post_id,
                comment.content,
                format_timestamp(&created_at),
            ],
        )?;

        Ok(Comment {
            id: conn.last_insert_rowid(),
            user_id: comment.user_id,
            post_id: comment.post_id,
            content: comment.content,
            created_at,
        })
    }

    pub fn get_by_id(&self, comment_id: CommentId) -> StoreResult<Option<Comment>> {
        let conn = self.pool.get()?;
        let comment = conn
            .query_row(
                "SELECT id, user_id, post_id, content, created_at FROM comments WHERE id = ?",
                [comment_id],
                Self::from_row,
            )
            .optional()?;
        Ok(comment)
    }

    /// Comments on a post, oldest first
    pub fn get_by_post(&self, post_id: PostId) -> StoreResult<Vec<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, post_id, content, created_at
             FROM comments
             WHERE post_id = ?
             ORDER BY created_at ASC, id ASC",
        )?;

        let comments = stmt
            .query_map([post_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    pub fn delete(&self, comment_id: CommentId) -> StoreResult<bool> {
        let conn = self.pool.get()?;
        let deleted = conn.execute("DELETE FROM comments WHERE id = ?", [comment_id])?;
        Ok(deleted > 0)
    }
}
