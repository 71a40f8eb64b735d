use async_trait::async_trait;
use common::domain::User;
use common::ports::{StoreError, UserStore};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::database::{decode_error, from_nanos, parse_uuid, to_nanos, Database};
use crate::error::db_error;

fn user_from_row(row: &SqliteRow) -> Result<User, StoreError> {
    let id: String = row.try_get("id").map_err(decode_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(decode_error)?;

    Ok(User {
        id: parse_uuid(&id)?,
        username: row.try_get("username").map_err(decode_error)?,
        password_hash: row.try_get("password_hash").map_err(decode_error)?,
        public_key: row.try_get("public_key").map_err(decode_error)?,
        encrypted_private_key: row.try_get("encrypted_private_key").map_err(decode_error)?,
        created_at: from_nanos(created_at)?,
    })
}

#[async_trait]
impl UserStore for Database {
    async fn save(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, public_key, encrypted_private_key, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.public_key)
        .bind(&user.encrypted_private_key)
        .bind(to_nanos(user.created_at)?)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("user", &user.username, e))?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, username, password_hash, public_key, encrypted_private_key, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("user", id, e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, username, password_hash, public_key, encrypted_private_key, created_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("user", username, e))?;

        row.as_ref().map(user_from_row).transpose()
    }
}
