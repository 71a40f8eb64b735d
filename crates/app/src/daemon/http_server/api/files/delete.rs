use axum::extract::State;
use axum::response::IntoResponse;
use http::StatusCode;
use uuid::Uuid;

use crate::daemon::http_server::auth::{Caller, RequestScope};
use crate::daemon::http_server::extract::Path;
use crate::daemon::http_server::ApiError;
use crate::ServiceState;

/// Removes the file, its content and every share of it.
#[tracing::instrument(skip_all, fields(caller_id = %caller.id))]
pub async fn handler(
    State(state): State<ServiceState>,
    scope: RequestScope,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.files().delete(scope.token(), id, caller.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
