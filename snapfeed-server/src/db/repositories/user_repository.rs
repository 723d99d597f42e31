use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};

use snapfeed_types::{NewUser, ProfileUpdate, User, UserId};

use crate::db::{DbPool, StoreError, StoreResult};

const USER_COLUMNS: &str = "id, username, password_hash, full_name, email, bio, profile_image";

/// Case-folded form stored in the `*_key` columns.
///
/// SQLite's `NOCASE` and `lower()` only fold ASCII, so folding happens here.
fn fold(value: &str) -> String {
    value.to_lowercase()
}

pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &Row) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            full_name: row.get(3)?,
            email: row.get(4)?,
            bio: row.get(5)?,
            profile_image: row.get(6)?,
        })
    }

    /// Create a new user.
    ///
    /// The uniqueness checks and the insert share one write transaction, so a
    /// concurrent registration cannot slip in between them.
    pub fn create(&self, user: NewUser) -> StoreResult<User> {
        let username_key = fold(&user.username);
        let email_key = fold(&user.email);

        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let username_taken = tx
            .query_row(
                "SELECT 1 FROM users WHERE username_key = ?",
                [&username_key],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if username_taken {
            return Err(StoreError::conflict("username", user.username));
        }

        let email_taken = tx
            .query_row(
                "SELECT 1 FROM users WHERE email_key = ?",
                [&email_key],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if email_taken {
            return Err(StoreError::conflict("email", user.email));
        }

        tx.execute(
            "INSERT INTO users (username, username_key, password_hash, full_name, full_name_key,
                                email, email_key, bio, profile_image)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                user.username,
                username_key,
                user.password_hash,
                user.full_name,
                fold(&user.full_name),
                user.email,
                email_key,
                user.bio,
                user.profile_image,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(User {
            id,
            username: user.username,
            password_hash: user.password_hash,
            full_name: user.full_name,
            email: user.email,
            bio: user.bio,
            profile_image: user.profile_image,
        })
    }

    /// Get user by ID
    pub fn get_by_id(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                [user_id],
                Self::from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Get user by username (case-insensitive)
    pub fn get_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE username_key = ?", USER_COLUMNS),
                [fold(username)],
                Self::from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Get user by email (case-insensitive)
    pub fn get_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email_key = ?", USER_COLUMNS),
                [fold(email)],
                Self::from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Substring search over username and full name
    pub fn search(&self, query: &str) -> StoreResult<Vec<User>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users
             WHERE instr(username_key, ?1) > 0
                OR instr(full_name_key, ?1) > 0
             ORDER BY id",
            USER_COLUMNS
        ))?;

        let users = stmt
            .query_map([fold(query)], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Apply a partial profile edit. Returns `None` when the user doesn't exist.
    pub fn update_profile(
        &self,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> StoreResult<Option<User>> {
        let full_name_key = update.full_name.as_deref().map(fold);

        let conn = self.pool.get()?;
        let changed = conn.execute(
            "UPDATE users
             SET full_name = COALESCE(?2, full_name),
                 full_name_key = COALESCE(?3, full_name_key),
                 bio = COALESCE(?4, bio),
                 profile_image = COALESCE(?5, profile_image)
             WHERE id = ?1",
            params![
                user_id,
                update.full_name,
                full_name_key,
                update.bio,
                update.profile_image
            ],
        )?;
        if changed == 0 {
            return Ok(None);
        }

        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                [user_id],
                Self::from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn count(&self) -> StoreResult<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
