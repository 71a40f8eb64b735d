use axum::extract::State;
use axum::response::IntoResponse;

use super::ShareResponse;
use crate::daemon::http_server::auth::{Caller, RequestScope};
use crate::daemon::http_server::extract::Json;
use crate::daemon::http_server::ApiError;
use crate::ServiceState;

/// Shares granted to the caller, newest first
pub async fn handler(
    State(state): State<ServiceState>,
    scope: RequestScope,
    caller: Caller,
) -> Result<impl IntoResponse, ApiError> {
    let shares = state
        .shares()
        .list_for_recipient(scope.token(), caller.id)
        .await?;
    Ok(Json(
        shares.iter().map(ShareResponse::from).collect::<Vec<_>>(),
    ))
}
