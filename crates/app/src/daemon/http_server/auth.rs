use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};
use http::request::Parts;
use tokio_util::sync::{CancellationToken, DropGuard};
use uuid::Uuid;

use super::error::ApiError;
use crate::daemon::session::SessionError;
use crate::ServiceState;

/// Cookie carrying the session token for browser clients
pub const SESSION_COOKIE: &str = "auth_token";

/// The authenticated user behind a request.
///
/// Read from `Authorization: Bearer <token>`, falling back to the session
/// cookie.
#[derive(Debug, Clone)]
pub struct Caller {
    pub id: Uuid,
    pub username: String,
}

#[async_trait]
impl FromRequestParts<ServiceState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServiceState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .or_else(|| cookie_token(&parts.headers))
            .ok_or_else(|| ApiError::Unauthenticated("missing session token".to_string()))?;

        let claims = state.sessions().verify(&token).map_err(|e| match e {
            SessionError::Expired => ApiError::Unauthenticated("session expired".to_string()),
            _ => ApiError::Unauthenticated("invalid session token".to_string()),
        })?;

        Ok(Caller {
            id: claims.sub,
            username: claims.username,
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().trim().to_string())
        .filter(|t| !t.is_empty())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|t| !t.is_empty())
}

/// Cookie installing a session token.
pub fn session_cookie(token: String, max_age_secs: u64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .max_age(time::Duration::seconds(
            i64::try_from(max_age_secs).unwrap_or(i64::MAX),
        ))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .build()
}

/// Cookie that makes the browser drop the session cookie.
pub fn clear_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    cookie.make_removal();
    cookie
}

/// Cancellation scope for one request.
///
/// Fires when the server shuts down or when the request future is dropped,
/// e.g. because the client went away or the request timed out.
pub struct RequestScope {
    token: CancellationToken,
    _guard: DropGuard,
}

impl RequestScope {
    pub fn new(parent: &CancellationToken) -> Self {
        let token = parent.child_token();
        let _guard = token.clone().drop_guard();
        Self { token, _guard }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[async_trait]
impl FromRequestParts<ServiceState> for RequestScope {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &ServiceState,
    ) -> Result<Self, Self::Rejection> {
        Ok(RequestScope::new(state.shutdown()))
    }
}
