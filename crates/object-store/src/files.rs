use async_trait::async_trait;
use common::domain::File;
use common::ports::{FileStore, StoreError};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::database::{decode_error, from_nanos, parse_uuid, to_nanos, Database};
use crate::error::db_error;

fn file_from_row(row: &SqliteRow) -> Result<File, StoreError> {
    let id: String = row.try_get("id").map_err(decode_error)?;
    let owner_id: String = row.try_get("owner_id").map_err(decode_error)?;
    let size: i64 = row.try_get("size").map_err(decode_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(decode_error)?;

    Ok(File {
        id: parse_uuid(&id)?,
        owner_id: parse_uuid(&owner_id)?,
        filename: row.try_get("filename").map_err(decode_error)?,
        mime_type: row.try_get("mime_type").map_err(decode_error)?,
        size: u64::try_from(size)
            .map_err(|_| StoreError::Unavailable(anyhow::anyhow!("negative size for file {}", id)))?,
        iv: row.try_get("iv").map_err(decode_error)?,
        encrypted_key: row.try_get("encrypted_key").map_err(decode_error)?,
        created_at: from_nanos(created_at)?,
    })
}

#[async_trait]
impl FileStore for Database {
    async fn save(&self, file: &File) -> Result<(), StoreError> {
        let size = i64::try_from(file.size)
            .map_err(|_| StoreError::Invalid(format!("file size out of range: {}", file.size)))?;

        sqlx::query(
            r#"
            INSERT INTO files (id, owner_id, filename, mime_type, size, iv, encrypted_key, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(file.id.to_string())
        .bind(file.owner_id.to_string())
        .bind(&file.filename)
        .bind(&file.mime_type)
        .bind(size)
        .bind(&file.iv)
        .bind(&file.encrypted_key)
        .bind(to_nanos(file.created_at)?)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("file", file.id, e))?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<File>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, filename, mime_type, size, iv, encrypted_key, created_at
            FROM files
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("file", id, e))?;

        row.as_ref().map(file_from_row).transpose()
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<File>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, filename, mime_type, size, iv, encrypted_key, created_at
            FROM files
            WHERE owner_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("file", owner_id, e))?;

        rows.iter().map(file_from_row).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        // Shares go with the file via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("file", id, e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("file", id));
        }
        Ok(())
    }
}
