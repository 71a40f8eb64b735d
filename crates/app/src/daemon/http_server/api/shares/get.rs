use axum::extract::State;
use axum::response::IntoResponse;
use uuid::Uuid;

use super::ShareResponse;
use crate::daemon::http_server::auth::{Caller, RequestScope};
use crate::daemon::http_server::extract::{Json, Path};
use crate::daemon::http_server::ApiError;
use crate::ServiceState;

/// The caller's active share of file `file_id`
pub async fn handler(
    State(state): State<ServiceState>,
    scope: RequestScope,
    caller: Caller,
    Path(file_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let share = state
        .shares()
        .get_active(scope.token(), file_id, caller.id)
        .await?;
    Ok(Json(ShareResponse::from(&share)))
}
