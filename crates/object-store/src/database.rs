//! SQLite database for file, share and user metadata.

use std::path::Path;

use common::ports::StoreError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::Result;

/// SQLite connection pool implementing the metadata ports.
#[derive(Debug, Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

impl Database {
    /// Open (or create) a database file and apply migrations.
    pub async fn new(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        tracing::info!(path = %path.display(), "sqlite database ready");
        Ok(db)
    }

    /// Create an in-memory database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        // Every connection to :memory: is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run database migrations.
    async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Round-trip a trivial query, for readiness checks.
    pub async fn ping(&self) -> std::result::Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(anyhow::Error::new(e)))?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

pub(crate) fn parse_uuid(value: &str) -> std::result::Result<Uuid, StoreError> {
    Uuid::parse_str(value)
        .map_err(|e| StoreError::Unavailable(anyhow::anyhow!("corrupt id {:?}: {}", value, e)))
}

/// Timestamps are stored as unix nanoseconds.
pub(crate) fn to_nanos(at: OffsetDateTime) -> std::result::Result<i64, StoreError> {
    i64::try_from(at.unix_timestamp_nanos())
        .map_err(|_| StoreError::Invalid(format!("timestamp out of range: {}", at)))
}

pub(crate) fn from_nanos(nanos: i64) -> std::result::Result<OffsetDateTime, StoreError> {
    OffsetDateTime::from_unix_timestamp_nanos(nanos as i128)
        .map_err(|e| StoreError::Unavailable(anyhow::anyhow!("corrupt timestamp {}: {}", nanos, e)))
}

pub(crate) fn decode_error(err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(anyhow::anyhow!("failed to decode row: {}", err))
}

#[cfg(test)]
impl Database {
    /// Count rows in a table (test-only).
    pub async fn count(&self, table: &str) -> i64 {
        use sqlx::Row;

        sqlx::query(&format!("SELECT COUNT(*) AS n FROM {}", table))
            .fetch_one(&self.pool)
            .await
            .unwrap()
            .get("n")
    }
}
