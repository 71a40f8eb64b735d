use axum::extract::State;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::prelude::User;

use crate::daemon::http_server::api::encode_b64;
use crate::daemon::http_server::auth::{Caller, RequestScope};
use crate::daemon::http_server::extract::{Json, Path};
use crate::daemon::http_server::ApiError;
use crate::ServiceState;

/// What a sharer needs to wrap a content key for a recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicKeyResponse {
    pub id: Uuid,
    pub username: String,
    pub public_key: String,
}

impl From<&User> for PublicKeyResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            public_key: encode_b64(&user.public_key),
        }
    }
}

pub async fn handler(
    State(state): State<ServiceState>,
    scope: RequestScope,
    _caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.identity().get_by_id(scope.token(), id).await?;
    Ok(Json(PublicKeyResponse::from(&user)))
}
