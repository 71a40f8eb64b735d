use axum::extract::State;
use axum::response::IntoResponse;
use axum_extra::extract::CookieJar;
use http::StatusCode;
use serde::{Deserialize, Serialize};

use super::UserResponse;
use crate::daemon::http_server::api::encode_b64;
use crate::daemon::http_server::auth::{session_cookie, RequestScope};
use crate::daemon::http_server::extract::Json;
use crate::daemon::http_server::ApiError;
use crate::ServiceState;

#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    /// Seconds until the token expires
    pub expires_in: u64,
    pub user: UserResponse,
    /// The private key as stored at registration, standard base64
    pub encrypted_private_key: String,
}

#[tracing::instrument(skip_all, fields(username = %req.username))]
pub async fn handler(
    State(state): State<ServiceState>,
    scope: RequestScope,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, encrypted_private_key) = state
        .identity()
        .authenticate(scope.token(), &req.username, &req.password)
        .await?;

    let token = state.sessions().issue(&user)?;
    let expires_in = state.sessions().ttl().as_secs();

    Ok((
        StatusCode::OK,
        jar.add(session_cookie(token.clone(), expires_in)),
        Json(LoginResponse {
            token,
            expires_in,
            user: UserResponse::from(&user),
            encrypted_private_key: encode_b64(&encrypted_private_key),
        }),
    ))
}
