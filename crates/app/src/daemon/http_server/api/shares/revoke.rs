use axum::extract::State;
use axum::response::IntoResponse;
use http::StatusCode;
use uuid::Uuid;

use crate::daemon::http_server::auth::{Caller, RequestScope};
use crate::daemon::http_server::extract::Path;
use crate::daemon::http_server::ApiError;
use crate::ServiceState;

#[tracing::instrument(skip_all, fields(caller_id = %caller.id))]
pub async fn handler(
    State(state): State<ServiceState>,
    scope: RequestScope,
    caller: Caller,
    Path(share_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .shares()
        .revoke(scope.token(), share_id, caller.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
