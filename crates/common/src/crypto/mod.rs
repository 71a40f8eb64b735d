//! Password digests for account authentication.
//!
//! Digests are Argon2id over a random per-user salt. Each digest records
//! the parameters it was derived with, so raising the cost for new
//! accounts never invalidates existing ones.

mod password;

pub use password::{Argon2Hasher, PasswordError, PasswordHasher, PasswordParams};
