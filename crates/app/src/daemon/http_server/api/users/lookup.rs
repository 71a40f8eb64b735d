use axum::extract::State;
use axum::response::IntoResponse;
use serde::Deserialize;

use super::PublicKeyResponse;
use crate::daemon::http_server::auth::{Caller, RequestScope};
use crate::daemon::http_server::extract::{Json, Query};
use crate::daemon::http_server::ApiError;
use crate::ServiceState;

#[derive(Debug, Clone, Deserialize)]
pub struct LookupQuery {
    pub username: String,
}

/// Resolve a username to its id and public key, so a sharer can address
/// a recipient by name.
pub async fn handler(
    State(state): State<ServiceState>,
    scope: RequestScope,
    _caller: Caller,
    Query(query): Query<LookupQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .identity()
        .get_by_username(scope.token(), &query.username)
        .await?;
    Ok(Json(PublicKeyResponse::from(&user)))
}
