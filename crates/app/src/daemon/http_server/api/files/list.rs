use axum::extract::State;
use axum::response::IntoResponse;

use super::FileResponse;
use crate::daemon::http_server::auth::{Caller, RequestScope};
use crate::daemon::http_server::extract::Json;
use crate::daemon::http_server::ApiError;
use crate::ServiceState;

/// The caller's own files, newest first
pub async fn handler(
    State(state): State<ServiceState>,
    scope: RequestScope,
    caller: Caller,
) -> Result<impl IntoResponse, ApiError> {
    let files = state.files().list_owned(scope.token(), caller.id).await?;
    Ok(Json(
        files.iter().map(FileResponse::from).collect::<Vec<_>>(),
    ))
}
