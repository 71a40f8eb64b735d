use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use common::prelude::Share;

use super::encode_b64;
use crate::ServiceState;

pub mod create;
pub mod get;
pub mod list;
pub mod revoke;

pub use create::CreateShareRequest;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/shares", post(create::handler).get(list::handler))
        .route("/shares/", post(create::handler).get(list::handler))
        // GET addresses a file, DELETE addresses a share
        .route("/shares/:id", get(get::handler).delete(revoke::handler))
        .with_state(state)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareResponse {
    pub id: Uuid,
    pub file_id: Uuid,
    pub recipient_id: Uuid,
    /// Standard base64
    pub wrapped_key: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&Share> for ShareResponse {
    fn from(share: &Share) -> Self {
        Self {
            id: share.id,
            file_id: share.file_id,
            recipient_id: share.recipient_id,
            wrapped_key: encode_b64(&share.wrapped_key),
            created_at: share.created_at,
        }
    }
}
