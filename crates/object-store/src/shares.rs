use async_trait::async_trait;
use common::domain::Share;
use common::ports::{ShareStore, StoreError};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::database::{decode_error, from_nanos, parse_uuid, to_nanos, Database};
use crate::error::db_error;

const SELECT_SHARES: &str =
    "SELECT id, file_id, recipient_id, wrapped_key, created_at FROM shares";

fn share_from_row(row: &SqliteRow) -> Result<Share, StoreError> {
    let id: String = row.try_get("id").map_err(decode_error)?;
    let file_id: String = row.try_get("file_id").map_err(decode_error)?;
    let recipient_id: String = row.try_get("recipient_id").map_err(decode_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(decode_error)?;

    Ok(Share {
        id: parse_uuid(&id)?,
        file_id: parse_uuid(&file_id)?,
        recipient_id: parse_uuid(&recipient_id)?,
        wrapped_key: row.try_get("wrapped_key").map_err(decode_error)?,
        created_at: from_nanos(created_at)?,
    })
}

#[async_trait]
impl ShareStore for Database {
    async fn save(&self, share: &Share) -> Result<(), StoreError> {
        // One grant per (file, recipient): a re-grant takes over the row
        sqlx::query(
            r#"
            INSERT INTO shares (id, file_id, recipient_id, wrapped_key, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(file_id, recipient_id) DO UPDATE SET
                id = excluded.id,
                wrapped_key = excluded.wrapped_key,
                created_at = excluded.created_at
            "#,
        )
        .bind(share.id.to_string())
        .bind(share.file_id.to_string())
        .bind(share.recipient_id.to_string())
        .bind(&share.wrapped_key)
        .bind(to_nanos(share.created_at)?)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("share", share.id, e))?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Share>, StoreError> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_SHARES))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("share", id, e))?;

        row.as_ref().map(share_from_row).transpose()
    }

    async fn find_by_recipient(&self, recipient_id: Uuid) -> Result<Vec<Share>, StoreError> {
        let rows = sqlx::query(&format!(
            "{} WHERE recipient_id = ? ORDER BY created_at DESC, id DESC",
            SELECT_SHARES
        ))
        .bind(recipient_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("share", recipient_id, e))?;

        rows.iter().map(share_from_row).collect()
    }

    async fn find_active(
        &self,
        file_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<Share>, StoreError> {
        let row = sqlx::query(&format!(
            "{} WHERE file_id = ? AND recipient_id = ?",
            SELECT_SHARES
        ))
        .bind(file_id.to_string())
        .bind(recipient_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("share", format!("{}/{}", file_id, recipient_id), e))?;

        row.as_ref().map(share_from_row).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM shares WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("share", id, e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("share", id));
        }
        Ok(())
    }
}
