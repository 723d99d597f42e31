use rusqlite::{OptionalExtension, Row};

use snapfeed_types::{Follow, NewFollow, UserId};

use crate::db::{DbPool, StoreResult};

pub struct FollowRepository {
    pool: DbPool,
}

impl FollowRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &Row) -> rusqlite::Result<Follow> {
        Ok(Follow {
            id: row.get(0)?,
            follower_id: row.get(1)?,
            following_id: row.get(2)?,
        })
    }

    /// Follow a user if not already following, returning the stored edge
    pub fn follow(&self, follow: NewFollow) -> StoreResult<Follow> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT OR IGNORE INTO follows (follower_id, following_id) VALUES (?, ?)",
            [follow.follower_id, follow.following_id],
        )?;

        let stored = conn.query_row(
            "SELECT id, follower_id, following_id FROM follows
             WHERE follower_id = ? AND following_id = ?",
            [follow.follower_id, follow.following_id],
            Self::from_row,
        )?;
        Ok(stored)
    }

    pub fn unfollow(&self, follower_id: UserId, following_id: UserId) -> StoreResult<bool> {
        let conn = self.pool.get()?;
        let deleted = conn.execute(
            "DELETE FROM follows WHERE follower_id = ? AND following_id = ?",
            [follower_id, following_id],
        )?;
        Ok(deleted > 0)
    }

    pub fn get(&self, follower_id: UserId, following_id: UserId) -> StoreResult<Option<Follow>> {
        let conn = self.pool.get()?;
        let follow = conn
            .query_row(
                "SELECT id, follower_id, following_id FROM follows
                 WHERE follower_id = ? AND following_id = ?",
                [follower_id, following_id],
                Self::from_row,
            )
            .optional()?;
        Ok(follow)
    }

    /// Edges pointing at `user_id`
    pub fn get_followers(&self, user_id: UserId) -> StoreResult<Vec<Follow>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, follower_id, following_id FROM follows WHERE following_id = ? ORDER BY id",
        )?;

        let follows = stmt
            .query_map([user_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(follows)
    }

    /// Edges starting at `user_id`
    pub fn get_following(&self, user_id: UserId) -> StoreResult<Vec<Follow>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, follower_id, following_id FROM follows WHERE follower_id = ? ORDER BY id",
        )?;

        let follows = stmt
            .query_map([user_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(follows)
    }

    pub fn count_followers(&self, user_id: UserId) -> StoreResult<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE following_id = ?",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn count_following(&self, user_id: UserId) -> StoreResult<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ?",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
