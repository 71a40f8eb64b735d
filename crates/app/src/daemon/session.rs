//! Signed session tokens.
//!
//! A token is `base64url(claims).base64url(signature)`, where the claims are
//! JSON and the signature is Ed25519 over the encoded claims. Tokens are
//! stateless: logging out only clears the client's cookie.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use common::prelude::User;

const PEM_TAG: &str = "PRIVATE KEY";
const KEY_SIZE: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to generate key: {0}")]
    Entropy(getrandom::Error),
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("failed to encode claims: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("malformed session token")]
    Malformed,
    #[error("session token signature mismatch")]
    BadSignature,
    #[error("session token expired")]
    Expired,
}

/// The server's Ed25519 signing key, persisted as `key.pem`.
#[derive(Clone)]
pub struct SessionKey(SigningKey);

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionKey")
            .field(&self.0.verifying_key())
            .finish()
    }
}

impl SessionKey {
    pub fn generate() -> Result<Self, SessionError> {
        let mut bytes = [0u8; KEY_SIZE];
        getrandom::getrandom(&mut bytes).map_err(SessionError::Entropy)?;
        Ok(Self(SigningKey::from_bytes(&bytes)))
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.0.verifying_key()
    }

    /// PEM with tag "PRIVATE KEY" holding the raw 32-byte seed
    pub fn to_pem(&self) -> String {
        let pem = pem::Pem::new(PEM_TAG, self.0.to_bytes().to_vec());
        pem::encode(&pem)
    }

    pub fn from_pem(pem_str: &str) -> Result<Self, SessionError> {
        let pem = pem::parse(pem_str)
            .map_err(|e| SessionError::InvalidKey(format!("failed to parse PEM: {}", e)))?;

        if pem.tag() != PEM_TAG {
            return Err(SessionError::InvalidKey(format!(
                "invalid PEM tag, expected {}",
                PEM_TAG
            )));
        }

        let bytes: [u8; KEY_SIZE] = pem.contents().try_into().map_err(|_| {
            SessionError::InvalidKey(format!(
                "invalid key size, expected {}, got {}",
                KEY_SIZE,
                pem.contents().len()
            ))
        })?;
        Ok(Self(SigningKey::from_bytes(&bytes)))
    }
}

/// What a verified token says about its bearer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub username: String,
    /// Issued at, unix seconds
    pub iat: i64,
    /// Expires at, unix seconds
    pub exp: i64,
}

/// Issues and verifies session tokens.
#[derive(Clone)]
pub struct SessionSigner {
    key: Arc<SessionKey>,
    ttl: Duration,
}

impl fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSigner")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionSigner {
    pub fn new(key: SessionKey, ttl: Duration) -> Self {
        Self {
            key: Arc::new(key),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user: &User) -> Result<String, SessionError> {
        self.issue_at(user, OffsetDateTime::now_utc().unix_timestamp())
    }

    fn issue_at(&self, user: &User, now: i64) -> Result<String, SessionError> {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = SessionClaims {
            sub: user.id,
            username: user.username.clone(),
            iat: now,
            exp: now.saturating_add(ttl),
        };

        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signature = self.key.0.sign(payload.as_bytes());
        Ok(format!(
            "{}.{}",
            payload,
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        ))
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, SessionError> {
        self.verify_at(token, OffsetDateTime::now_utc().unix_timestamp())
    }

    fn verify_at(&self, token: &str, now: i64) -> Result<SessionClaims, SessionError> {
        let (payload, signature) = token.split_once('.').ok_or(SessionError::Malformed)?;

        let signature: [u8; 64] = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| SessionError::Malformed)?
            .try_into()
            .map_err(|_| SessionError::Malformed)?;
        self.key
            .verifying_key()
            .verify(payload.as_bytes(), &Signature::from_bytes(&signature))
            .map_err(|_| SessionError::BadSignature)?;

        let claims: SessionClaims = URL_SAFE_NO_PAD
            .decode(payload)
            .ok()
            .and_then(|json| serde_json::from_slice(&json).ok())
            .ok_or(SessionError::Malformed)?;

        if now >= claims.exp {
            return Err(SessionError::Expired);
        }
        Ok(claims)
    }
}
