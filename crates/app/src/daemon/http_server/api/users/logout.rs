use axum::response::IntoResponse;
use axum_extra::extract::CookieJar;
use http::StatusCode;

use crate::daemon::http_server::auth::clear_session_cookie;

/// Tokens are stateless, so this only clears the browser cookie.
pub async fn handler(jar: CookieJar) -> impl IntoResponse {
    (StatusCode::NO_CONTENT, jar.add(clear_session_cookie()))
}
