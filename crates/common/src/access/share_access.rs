use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{metadata, AccessError};
use crate::domain::{File, Share};
use crate::ports::{FileStore, ShareStore, UserStore};

/// Grants and revokes recipients' access to files.
///
/// Authority is re-derived on every call from the live file's owner; a
/// share record alone never authorizes anything.
#[derive(Clone)]
pub struct ShareAccess {
    files: Arc<dyn FileStore>,
    shares: Arc<dyn ShareStore>,
    users: Arc<dyn UserStore>,
}

impl ShareAccess {
    pub fn new(
        files: Arc<dyn FileStore>,
        shares: Arc<dyn ShareStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            files,
            shares,
            users,
        }
    }

    /// Grant `recipient_id` the content key rewrapped under its key material.
    ///
    /// Re-granting an existing pair replaces the wrapped key and issues a new
    /// share id. Sharing with oneself is allowed.
    #[tracing::instrument(skip_all, fields(%file_id, %owner_id, %recipient_id))]
    pub async fn grant(
        &self,
        cancel: &CancellationToken,
        file_id: Uuid,
        owner_id: Uuid,
        recipient_id: Uuid,
        wrapped_key: Vec<u8>,
    ) -> Result<Share, AccessError> {
        const OP: &str = "grant";

        if wrapped_key.is_empty() {
            return Err(AccessError::InvalidInput("wrapped key is required".to_string()));
        }

        let file = self.load_file(cancel, OP, file_id).await?;
        if file.owner_id != owner_id {
            return Err(AccessError::unauthorized(OP, owner_id, "file", file_id));
        }

        if metadata(cancel, OP, self.users.find_by_id(recipient_id))
            .await?
            .is_none()
        {
            return Err(AccessError::not_found("user", recipient_id));
        }

        let share = Share::new(file_id, recipient_id, wrapped_key);
        metadata(cancel, OP, self.shares.save(&share)).await?;

        tracing::info!(share_id = %share.id, "share granted");
        Ok(share)
    }

    /// Newest first.
    #[tracing::instrument(skip_all, fields(%recipient_id))]
    pub async fn list_for_recipient(
        &self,
        cancel: &CancellationToken,
        recipient_id: Uuid,
    ) -> Result<Vec<Share>, AccessError> {
        metadata(
            cancel,
            "list_for_recipient",
            self.shares.find_by_recipient(recipient_id),
        )
        .await
    }

    #[tracing::instrument(skip_all, fields(%file_id, %recipient_id))]
    pub async fn get_active(
        &self,
        cancel: &CancellationToken,
        file_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Share, AccessError> {
        metadata(
            cancel,
            "get_active",
            self.shares.find_active(file_id, recipient_id),
        )
        .await?
        .ok_or_else(|| AccessError::not_found("share", format!("{}/{}", file_id, recipient_id)))
    }

    /// Only the owner of the shared file may revoke. A share whose file is
    /// gone reports the file as not found.
    #[tracing::instrument(skip_all, fields(%share_id, %caller_id))]
    pub async fn revoke(
        &self,
        cancel: &CancellationToken,
        share_id: Uuid,
        caller_id: Uuid,
    ) -> Result<(), AccessError> {
        const OP: &str = "revoke";

        let share = metadata(cancel, OP, self.shares.find_by_id(share_id))
            .await?
            .ok_or_else(|| AccessError::not_found("share", share_id))?;

        let file = self.load_file(cancel, OP, share.file_id).await?;
        if file.owner_id != caller_id {
            return Err(AccessError::unauthorized(OP, caller_id, "share", share_id));
        }

        metadata(cancel, OP, self.shares.delete(share_id)).await?;

        tracing::info!(file_id = %share.file_id, "share revoked");
        Ok(())
    }

    async fn load_file(
        &self,
        cancel: &CancellationToken,
        op: &'static str,
        file_id: Uuid,
    ) -> Result<File, AccessError> {
        metadata(cancel, op, self.files.find_by_id(file_id))
            .await?
            .ok_or_else(|| AccessError::not_found("file", file_id))
    }
}
