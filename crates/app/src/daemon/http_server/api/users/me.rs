use axum::extract::State;
use axum::response::IntoResponse;

use super::UserResponse;
use crate::daemon::http_server::auth::{Caller, RequestScope};
use crate::daemon::http_server::extract::Json;
use crate::daemon::http_server::ApiError;
use crate::ServiceState;

pub async fn handler(
    State(state): State<ServiceState>,
    scope: RequestScope,
    caller: Caller,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.identity().get_by_id(scope.token(), caller.id).await?;
    Ok(Json(UserResponse::from(&user)))
}
