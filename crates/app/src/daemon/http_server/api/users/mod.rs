use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use common::prelude::User;

use super::encode_b64;
use crate::ServiceState;

pub mod login;
pub mod logout;
pub mod lookup;
pub mod me;
pub mod public_key;
pub mod register;

pub use login::{LoginRequest, LoginResponse};
pub use public_key::PublicKeyResponse;
pub use register::RegisterRequest;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/users/register", post(register::handler))
        .route("/users/login", post(login::handler))
        .route("/users/logout", post(logout::handler))
        .route("/users/me", get(me::handler))
        .route("/users/lookup", get(lookup::handler))
        .route("/users/:id/public_key", get(public_key::handler))
        .with_state(state)
}

/// Public view of an account. The password digest never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    /// Standard base64
    pub public_key: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            public_key: encode_b64(&user.public_key),
            created_at: user.created_at,
        }
    }
}
