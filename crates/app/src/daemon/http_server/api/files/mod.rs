use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use common::prelude::File;

use super::encode_b64;
use crate::ServiceState;

pub mod delete;
pub mod download;
pub mod get;
pub mod list;
pub mod upload;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/files", post(upload::handler).get(list::handler))
        .route("/files/", post(upload::handler).get(list::handler))
        .route("/files/:id", get(get::handler).delete(delete::handler))
        .route("/files/:id/download", get(download::handler))
        .with_state(state)
}

/// File metadata as returned to its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub filename: String,
    pub mime_type: String,
    pub size: u64,
    /// Standard base64
    pub iv: String,
    /// Standard base64
    pub encrypted_key: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&File> for FileResponse {
    fn from(file: &File) -> Self {
        Self {
            id: file.id,
            owner_id: file.owner_id,
            filename: file.filename.clone(),
            mime_type: file.mime_type.clone(),
            size: file.size,
            iv: encode_b64(&file.iv),
            encrypted_key: encode_b64(&file.encrypted_key),
            created_at: file.created_at,
        }
    }
}
