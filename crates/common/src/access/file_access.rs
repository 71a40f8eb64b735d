use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{checkpoint, content, guard, metadata, AccessError};
use crate::domain::{File, NewFile};
use crate::ports::{ContentStore, ContentStream, FileStore, ShareStore};

/// A successful download.
pub struct Download {
    pub file: File,
    pub content: ContentStream,
    /// The recipient's wrapped content key. `None` for the owner, who
    ///  already holds the key client-side.
    pub key_material: Option<Vec<u8>>,
}

impl fmt::Debug for Download {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Download")
            .field("file", &self.file)
            .field("key_material", &self.key_material.as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}

/// Uploads, downloads and deletes files on behalf of an authenticated caller.
///
/// Upload and delete span the metadata and content stores without a shared
/// transaction. Content is always written (or removed) first, so a metadata
/// record never points at missing content; the reverse window surfaces as
/// [`AccessError::Orphaned`] on upload.
#[derive(Clone)]
pub struct FileAccess {
    files: Arc<dyn FileStore>,
    shares: Arc<dyn ShareStore>,
    content: Arc<dyn ContentStore>,
}

impl FileAccess {
    pub fn new(
        files: Arc<dyn FileStore>,
        shares: Arc<dyn ShareStore>,
        content: Arc<dyn ContentStore>,
    ) -> Self {
        Self {
            files,
            shares,
            content,
        }
    }

    #[tracing::instrument(skip_all, fields(%owner_id, filename = %new.filename, size = new.size))]
    pub async fn upload(
        &self,
        cancel: &CancellationToken,
        owner_id: Uuid,
        new: NewFile,
        stream: ContentStream,
    ) -> Result<File, AccessError> {
        const OP: &str = "upload";

        if new.filename.trim().is_empty() {
            return Err(AccessError::InvalidInput("filename is required".to_string()));
        }
        if new.mime_type.trim().is_empty() {
            return Err(AccessError::InvalidInput("mime type is required".to_string()));
        }

        // Fast path only; the create-only content write below is what keeps a
        // caller-chosen id from replacing someone else's content
        if let Some(id) = new.id {
            if metadata(cancel, OP, self.files.find_by_id(id)).await?.is_some() {
                return Err(AccessError::Conflict(format!("file already exists: {}", id)));
            }
        }

        let file = new.into_file(owner_id);
        let key = file.content_key();

        content(
            cancel,
            OP,
            self.content.put(&key, stream, file.size, &file.mime_type),
        )
        .await?;

        if let Err(e) = checkpoint(cancel, OP) {
            tracing::warn!(file_id = %file.id, "upload cancelled after content write, content orphaned");
            return Err(e);
        }

        match guard(cancel, OP, self.files.save(&file)).await {
            Ok(Ok(())) => {
                tracing::info!(file_id = %file.id, "file uploaded");
                Ok(file)
            }
            Ok(Err(source)) => {
                tracing::error!(file_id = %file.id, error = %source, "failed to record metadata, content orphaned");
                Err(AccessError::Orphaned {
                    file_id: file.id,
                    source,
                })
            }
            Err(e) => {
                tracing::warn!(file_id = %file.id, "upload cancelled while recording metadata");
                Err(e)
            }
        }
    }

    /// Owner first, then an active share; content is only fetched once
    /// the caller is authorized.
    #[tracing::instrument(skip_all, fields(%file_id, %caller_id))]
    pub async fn download(
        &self,
        cancel: &CancellationToken,
        file_id: Uuid,
        caller_id: Uuid,
    ) -> Result<Download, AccessError> {
        const OP: &str = "download";

        let file = self.load(cancel, OP, file_id).await?;

        let key_material = if file.owner_id == caller_id {
            None
        } else {
            match metadata(cancel, OP, self.shares.find_active(file_id, caller_id)).await? {
                Some(share) => Some(share.wrapped_key),
                None => return Err(AccessError::unauthorized(OP, caller_id, "file", file_id)),
            }
        };

        let stream = content(cancel, OP, self.content.get(&file.content_key())).await?;

        Ok(Download {
            file,
            content: stream,
            key_material,
        })
    }

    /// Metadata for a file the caller owns. The record carries no viewer
    /// filter of its own, so ownership is checked here against `caller_id`.
    #[tracing::instrument(skip_all, fields(%file_id, %caller_id))]
    pub async fn get_metadata(
        &self,
        cancel: &CancellationToken,
        file_id: Uuid,
        caller_id: Uuid,
    ) -> Result<File, AccessError> {
        const OP: &str = "get_metadata";

        let file = self.load(cancel, OP, file_id).await?;
        if file.owner_id != caller_id {
            return Err(AccessError::unauthorized(OP, caller_id, "file", file_id));
        }
        Ok(file)
    }

    /// Newest first.
    #[tracing::instrument(skip_all, fields(%owner_id))]
    pub async fn list_owned(
        &self,
        cancel: &CancellationToken,
        owner_id: Uuid,
    ) -> Result<Vec<File>, AccessError> {
        metadata(cancel, "list_owned", self.files.find_by_owner(owner_id)).await
    }

    /// Removes content, then metadata (and with it every share of the file).
    /// A failed or cancelled content delete leaves the metadata in place.
    #[tracing::instrument(skip_all, fields(%file_id, %caller_id))]
    pub async fn delete(
        &self,
        cancel: &CancellationToken,
        file_id: Uuid,
        caller_id: Uuid,
    ) -> Result<(), AccessError> {
        const OP: &str = "delete";

        let file = self.load(cancel, OP, file_id).await?;
        if file.owner_id != caller_id {
            return Err(AccessError::unauthorized(OP, caller_id, "file", file_id));
        }

        content(cancel, OP, self.content.delete(&file.content_key())).await?;
        checkpoint(cancel, OP)?;
        metadata(cancel, OP, self.files.delete(file_id)).await?;

        tracing::info!("file deleted");
        Ok(())
    }

    async fn load(
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
