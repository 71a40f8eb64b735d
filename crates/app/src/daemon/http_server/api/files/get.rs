use axum::extract::State;
use axum::response::IntoResponse;
use uuid::Uuid;

use super::FileResponse;
use crate::daemon::http_server::auth::{Caller, RequestScope};
use crate::daemon::http_server::extract::{Json, Path};
use crate::daemon::http_server::ApiError;
use crate::ServiceState;

pub async fn handler(
    State(state): State<ServiceState>,
    scope: RequestScope,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let file = state
        .files()
        .get_metadata(scope.token(), id, caller.id)
        .await?;
    Ok(Json(FileResponse::from(&file)))
}
