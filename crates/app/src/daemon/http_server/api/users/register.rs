use axum::extract::State;
use axum::response::IntoResponse;
use http::StatusCode;
use serde::{Deserialize, Serialize};

use super::UserResponse;
use crate::daemon::http_server::api::decode_b64;
use crate::daemon::http_server::auth::RequestScope;
use crate::daemon::http_server::extract::Json;
use crate::daemon::http_server::ApiError;
use crate::ServiceState;

/// Key material is generated client-side; both keys are standard base64.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub public_key: String,
    #[serde(default)]
    pub encrypted_private_key: String,
}

#[tracing::instrument(skip_all, fields(username = %req.username))]
pub async fn handler(
    State(state): State<ServiceState>,
    scope: RequestScope,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let public_key = decode_b64("public_key", &req.public_key)?;
    let encrypted_private_key = decode_b64("encrypted_private_key", &req.encrypted_private_key)?;

    let user = state
        .identity()
        .register(
            scope.token(),
            &req.username,
            &req.password,
            public_key,
            encrypted_private_key,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}
