use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE, ORIGIN};
use http::{HeaderName, Method};
use tower_http::cors::{Any, CorsLayer};

pub mod files;
pub mod shares;
pub mod users;

use super::error::ApiError;
use crate::ServiceState;

/// Header carrying a file's initialization vector on download
pub const IV_HEADER: &str = "x-iv";
/// Header carrying a recipient's wrapped content key on download
pub const WRAPPED_KEY_HEADER: &str = "x-wrapped-key";

pub fn router(state: ServiceState) -> Router<ServiceState> {
    let cors_layer = CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::POST, Method::DELETE])
        .allow_headers(vec![ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN])
        .expose_headers(vec![
            CONTENT_DISPOSITION,
            HeaderName::from_static(IV_HEADER),
            HeaderName::from_static(WRAPPED_KEY_HEADER),
        ])
        .allow_origin(Any)
        .allow_credentials(false);

    Router::new()
        .merge(users::router(state.clone()))
        .merge(files::router(state.clone()))
        .merge(shares::router(state.clone()))
        .with_state(state)
        .layer(cors_layer)
}

pub(crate) fn encode_b64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub(crate) fn decode_b64(field: &str, value: &str) -> Result<Vec<u8>, ApiError> {
    STANDARD
        .decode(value.trim())
        .map_err(|_| ApiError::bad_request(format!("{} must be base64", field)))
}
