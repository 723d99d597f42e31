use anyhow::{Context, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

use super::schema::SCHEMA;

/// SQLite in-memory database identifier
const MEMORY_DB_PATH: &str = ":memory:";

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Database wrapper with connection pooling support
#[derive(Clone)]
pub struct Database {
    pub pool: DbPool,
}

impl Database {
    /// Create a new database connection pool
    ///
    /// # Arguments
    /// * `path` - Database file path or ":memory:" for an in-memory database
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy();

        let built = if Self::is_memory_path(&path_str) {
            // Every `:memory:` connection is a separate database, so the pool
            // must hold exactly one connection and never recycle it.
            Pool::builder()
                .max_size(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .build(SqliteConnectionManager::memory())
        } else {
            Pool::new(SqliteConnectionManager::file(path.as_ref()))
        };
        let pool = built.context("Failed to create database connection pool")?;

        Ok(Self { pool })
    }

    fn is_memory_path(path: &str) -> bool {
        path.trim().eq_ignore_ascii_case(MEMORY_DB_PATH)
    }

    /// Create an in-memory database pool (useful for testing)
    pub fn in_memory() -> Result<Self> {
        Self::new(MEMORY_DB_PATH)
    }

    /// Initialize the database schema. Safe to run more than once.
    pub fn initialize(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize database schema")?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn connection(&self) -> Result<DbConnection> {
        self.pool
            .get()
            .context("Failed to get database connection from pool")
    }
}
