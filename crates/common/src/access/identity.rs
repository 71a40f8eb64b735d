use std::sync::Arc;

use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{guard, metadata, AccessError};
use crate::crypto::{PasswordError, PasswordHasher};
use crate::domain::User;
use crate::ports::UserStore;

/// Longest accepted username, in characters
pub const MAX_USERNAME_LEN: usize = 64;

/// Account registration and password authentication.
///
/// Session issuance happens at the boundary; this only answers "who is this".
#[derive(Clone)]
pub struct Identity {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl Identity {
    pub fn new(users: Arc<dyn UserStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { users, hasher }
    }

    /// Create an account. Fails with a conflict iff the username is taken.
    #[tracing::instrument(skip_all, fields(%username))]
    pub async fn register(
        &self,
        cancel: &CancellationToken,
        username: &str,
        password: &str,
        public_key: Vec<u8>,
        encrypted_private_key: Vec<u8>,
    ) -> Result<User, AccessError> {
        const OP: &str = "register";

        validate_username(username)?;
        if password.is_empty() {
            return Err(AccessError::InvalidInput("password is required".to_string()));
        }
        if public_key.is_empty() {
            return Err(AccessError::InvalidInput("public key is required".to_string()));
        }

        if metadata(cancel, OP, self.users.find_by_username(username))
            .await?
            .is_some()
        {
            return Err(AccessError::Conflict(format!(
                "username already taken: {}",
                username
            )));
        }

        let hasher = self.hasher.clone();
        let secret = password.as_bytes().to_vec();
        let password_hash = blocking(cancel, OP, move || hasher.hash(&secret))
            .await?
            .map_err(|e| {
                tracing::error!(error = %e, "failed to derive password digest");
                AccessError::Internal {
                    op: OP,
                    message: format!("password could not be hashed: {}", e),
                }
            })?;

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash,
            public_key,
            encrypted_private_key,
            created_at: OffsetDateTime::now_utc(),
        };

        // A concurrent registration can still win the race; the store's
        // uniqueness check reports it as a conflict
        metadata(cancel, OP, self.users.save(&user)).await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Check a password, returning the account and its wrapped private key.
    ///
    /// Unknown usernames and wrong passwords are indistinguishable, in both
    /// the error and the time taken.
    #[tracing::instrument(skip_all, fields(%username))]
    pub async fn authenticate(
        &self,
        cancel: &CancellationToken,
        username: &str,
        password: &str,
    ) -> Result<(User, Vec<u8>), AccessError> {
        const OP: &str = "authenticate";

        let user = metadata(cancel, OP, self.users.find_by_username(username)).await?;

        let hasher = self.hasher.clone();
        let secret = password.as_bytes().to_vec();
        let digest = user.as_ref().map(|u| u.password_hash.clone());
        let verified = blocking(cancel, OP, move || {
            let digest = digest.as_deref().unwrap_or_else(|| hasher.dummy_digest());
            hasher.verify(&secret, digest)
        })
        .await?;

        match (user, verified) {
            (Some(user), Ok(true)) => {
                let encrypted_private_key = user.encrypted_private_key.clone();
                tracing::info!(user_id = %user.id, "user authenticated");
                Ok((user, encrypted_private_key))
            }
            (Some(user), Err(PasswordError::MalformedDigest)) => {
                tracing::error!(user_id = %user.id, "stored password digest is malformed");
                Err(AccessError::Unauthenticated)
            }
            (_, Err(e)) => {
                tracing::error!(error = %e, "password verification failed");
                Err(AccessError::Unauthenticated)
            }
            _ => {
                tracing::debug!("invalid credentials");
                Err(AccessError::Unauthenticated)
            }
        }
    }

    pub async fn get_by_id(&self, cancel: &CancellationToken, id: Uuid) -> Result<User, AccessError> {
        metadata(cancel, "get_user", self.users.find_by_id(id))
            .await?
            .ok_or_else(|| AccessError::not_found("user", id))
    }

    pub async fn get_by_username(
        &self,
        cancel: &CancellationToken,
        username: &str,
    ) -> Result<User, AccessError> {
        metadata(cancel, "get_user", self.users.find_by_username(username))
            .await?
            .ok_or_else(|| AccessError::not_found("user", username))
    }
}

fn validate_username(username: &str) -> Result<(), AccessError> {
    if username.is_empty() {
        return Err(AccessError::InvalidInput("username is required".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AccessError::InvalidInput(format!(
            "username exceeds {} characters",
            MAX_USERNAME_LEN
        )));
    }
    if username.trim() != username || username.chars().any(char::is_control) {
        return Err(AccessError::InvalidInput(
            "username has surrounding whitespace or control characters".to_string(),
        ));
    }
    Ok(())
}

/// Run CPU-bound work on the blocking pool, racing `cancel`.
async fn blocking<T, F>(cancel: &CancellationToken, op: &'static str, f: F) -> Result<T, AccessError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    match guard(cancel, op, tokio::task::spawn_blocking(f)).await? {
        Ok(out) => Ok(out),
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(_) => Err(AccessError::Cancelled { op }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("Alice_99").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username(" alice").is_err());
        assert!(validate_username("al\nice").is_err());
        assert!(validate_username(&"a".repeat(MAX_USERNAME_LEN + 1)).is_err());
    }
}
