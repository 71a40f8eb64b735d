use axum::response::IntoResponse;
use axum::Json;

use common::prelude::build_info;

/// Build metadata of the running binary
pub async fn handler() -> impl IntoResponse {
    Json(build_info())
}
