use axum::extract::State;
use axum::response::IntoResponse;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ShareResponse;
use crate::daemon::http_server::api::decode_b64;
use crate::daemon::http_server::auth::{Caller, RequestScope};
use crate::daemon::http_server::extract::Json;
use crate::daemon::http_server::ApiError;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShareRequest {
    pub file_id: Uuid,
    pub recipient_id: Uuid,
    /// The content key wrapped for the recipient, standard base64
    pub wrapped_key: String,
}

#[tracing::instrument(skip_all, fields(caller_id = %caller.id))]
pub async fn handler(
    State(state): State<ServiceState>,
    scope: RequestScope,
    caller: Caller,
    Json(req): Json<CreateShareRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let wrapped_key = decode_b64("wrapped_key", &req.wrapped_key)?;

    let share = state
        .shares()
        .grant(
            scope.token(),
            req.file_id,
            caller.id,
            req.recipient_id,
            wrapped_key,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ShareResponse::from(&share))))
}
