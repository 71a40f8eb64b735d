use argon2::{Algorithm, Argon2, Params, Version};
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// Size of the random salt in bytes
pub const SALT_SIZE: usize = 16;
/// Size of the derived hash in bytes
pub const HASH_SIZE: usize = 32;

const ALGORITHM_TAG: &str = "argon2id";

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("invalid argon2 parameters: {0}")]
    Params(argon2::Error),
    #[error("key derivation failed: {0}")]
    Derivation(argon2::Error),
    #[error("failed to generate salt: {0}")]
    Salt(getrandom::Error),
    #[error("malformed password digest")]
    MalformedDigest,
}

/// Derives and checks password digests.
///
/// Implementations are synchronous and CPU-bound; callers on an async
/// runtime should move them onto the blocking pool.
pub trait PasswordHasher: Send + Sync + 'static {
    /// Derive a self-describing digest with a fresh salt
    fn hash(&self, password: &[u8]) -> Result<String, PasswordError>;

    /// Recompute the digest and compare in constant time
    fn verify(&self, password: &[u8], digest: &str) -> Result<bool, PasswordError>;

    /// A valid digest no real password maps to, verified against when an
    ///  account does not exist so lookups cost the same either way
    fn dummy_digest(&self) -> &str;
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordParams {
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl PasswordParams {
    /// Minimal cost, for tests only
    pub fn insecure_fast() -> Self {
        Self {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        }
    }

    fn encode(&self) -> String {
        format!(
            "m={},t={},p={}",
            self.memory_kib, self.iterations, self.parallelism
        )
    }

    fn decode(s: &str) -> Result<Self, PasswordError> {
        let mut memory_kib = None;
        let mut iterations = None;
        let mut parallelism = None;

        for pair in s.split(',') {
            let (key, value) = pair.split_once('=').ok_or(PasswordError::MalformedDigest)?;
            let value: u32 = value.parse().map_err(|_| PasswordError::MalformedDigest)?;
            match key {
                "m" => memory_kib = Some(value),
                "t" => iterations = Some(value),
                "p" => parallelism = Some(value),
                _ => return Err(PasswordError::MalformedDigest),
            }
        }

        match (memory_kib, iterations, parallelism) {
            (Some(memory_kib), Some(iterations), Some(parallelism)) => Ok(Self {
                memory_kib,
                iterations,
                parallelism,
            }),
            _ => Err(PasswordError::MalformedDigest),
        }
    }

    fn derive(&self, password: &[u8], salt: &[u8], out: &mut [u8]) -> Result<(), PasswordError> {
        let params = Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(out.len()),
        )
        .map_err(PasswordError::Params)?;

        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            .hash_password_into(password, salt, out)
            .map_err(PasswordError::Derivation)
    }
}

/// Argon2id digests in the form
/// `argon2id$m=<kib>,t=<iterations>,p=<lanes>$<salt>$<hash>`.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: PasswordParams,
    dummy: String,
}

impl Argon2Hasher {
    /// Validates `params` by deriving the dummy digest up front.
    pub fn new(params: PasswordParams) -> Result<Self, PasswordError> {
        let mut filler = [0u8; HASH_SIZE];
        getrandom::getrandom(&mut filler).map_err(PasswordError::Salt)?;

        let mut hasher = Self {
            params,
            dummy: String::new(),
        };
        hasher.dummy = hasher.hash(&filler)?;
        Ok(hasher)
    }

    pub fn params(&self) -> PasswordParams {
        self.params
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &[u8]) -> Result<String, PasswordError> {
        let mut salt = [0u8; SALT_SIZE];
        getrandom::getrandom(&mut salt).map_err(PasswordError::Salt)?;

        let mut hash = [0u8; HASH_SIZE];
        self.params.derive(password, &salt, &mut hash)?;

        Ok(format!(
            "{}${}${}${}",
            ALGORITHM_TAG,
            self.params.encode(),
            STANDARD_NO_PAD.encode(salt),
            STANDARD_NO_PAD.encode(hash)
        ))
    }

    fn verify(&self, password: &[u8], digest: &str) -> Result<bool, PasswordError> {
        let parts: Vec<&str> = digest.split('$').collect();
        let [tag, params, salt, expected] = parts.as_slice() else {
            return Err(PasswordError::MalformedDigest);
        };
        if *tag != ALGORITHM_TAG {
            return Err(PasswordError::MalformedDigest);
        }

        let params = PasswordParams::decode(params)?;
        let salt = STANDARD_NO_PAD
            .decode(salt)
            .map_err(|_| PasswordError::MalformedDigest)?;
        let expected = STANDARD_NO_PAD
            .decode(expected)
            .map_err(|_| PasswordError::MalformedDigest)?;
        if expected.is_empty() {
            return Err(PasswordError::MalformedDigest);
        }

        let mut actual = vec![0u8; expected.len()];
        params.derive(password, &salt, &mut actual)?;

        Ok(actual.ct_eq(&expected).into())
    }

    fn dummy_digest(&self) -> &str {
        &self.dummy
    }
}
