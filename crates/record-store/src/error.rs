use thiserror::Error;

use crate::Version;

/// Errors that can occur when interacting with the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record changed since it was read: the expected version did not
    /// match the persisted one.
    #[error("Concurrency conflict for record {key}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        key: String,
        expected: Version,
        actual: Version,
    },

    /// A record with this key already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// No record exists under this key.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// The backend refused the operation (I/O fault, injected failure).
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true if the error means "lost a race, re-read and retry".
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::ConcurrencyConflict { .. })
    }
}

/// Result type for record store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
