//! Error types for setting up the storage backends.

use common::ports::StoreError;

/// Errors that can occur while opening a database or object store.
///
/// Failures during normal operation are reported as [`StoreError`].
#[derive(Debug, thiserror::Error)]
pub enum StorageSetupError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Object storage error
    #[error("object storage error: {0}")]
    ObjectStore(#[from] object_store::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// S3 bucket not found - must be created before use
    #[error("S3 bucket '{0}' does not exist. Create it before starting the daemon.")]
    BucketNotFound(String),
}

/// Result type alias for setup operations.
pub type Result<T> = std::result::Result<T, StorageSetupError>;

/// Classify a driver error from a query that touched `entity`.
pub(crate) fn db_error(entity: &'static str, key: impl ToString, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Duplicate {
                entity,
                key: key.to_string(),
            };
        }
        if db.is_foreign_key_violation() {
            return StoreError::Invalid(format!("{} references a missing record", entity));
        }
    }
    StoreError::Unavailable(anyhow::Error::new(err))
}

/// Classify an object storage error for the object at `key`.
pub(crate) fn object_error(key: &str, err: object_store::Error) -> StoreError {
    match err {
        object_store::Error::NotFound { .. } => StoreError::not_found("content", key),
        object_store::Error::AlreadyExists { .. } => StoreError::Duplicate {
            entity: "content",
            key: key.to_string(),
        },
        err => StoreError::Unavailable(anyhow::Error::new(err)),
    }
}
