use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures surfaced by a storage backend.
///
/// A missing entity is not an error: lookups return `Ok(None)` instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique field is already taken by another record
    #[error("{field} '{value}' is already taken")]
    Conflict { field: &'static str, value: String },

    #[error("storage lock poisoned")]
    Poisoned,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

impl StoreError {
    pub fn conflict(field: &'static str, value: impl Into<String>) -> Self {
        StoreError::Conflict {
            field,
            value: value.into(),
        }
    }
}
