use std::fmt;

use time::OffsetDateTime;
use uuid::Uuid;

/// A registered account.
///
/// `public_key` and `encrypted_private_key` are supplied by the client at
/// registration and returned verbatim; the private key is wrapped under a
/// key derived from the user's password and never unwrapped server-side.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Encoded password digest, see [`crate::crypto::PasswordHasher`]
    pub password_hash: String,
    pub public_key: Vec<u8>,
    pub encrypted_private_key: Vec<u8>,
    pub created_at: OffsetDateTime,
}

// Keep digests out of logs
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("public_key_len", &self.public_key.len())
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_digest() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            password_hash: "argon2id$secret-digest".to_string(),
            public_key: vec![1, 2, 3],
            encrypted_private_key: vec![4, 5, 6],
            created_at: OffsetDateTime::now_utc(),
        };
        let rendered = format!("{:?}", user);
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("secret-digest"));
    }
}
