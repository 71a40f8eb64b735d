/**
 * Cancellation-aware access-control core.
 *  - FileAccess: upload, download, delete
 *  - ShareAccess: grant and revoke recipients
 *  - Identity: registration and authentication
 */
pub mod access;
/**
 * Password digests for the identity core.
 */
pub mod crypto;
/**
 * Passive records: users, files and shares.
 */
pub mod domain;
/**
 * In-memory port implementations, used by
 *  tests and ephemeral deployments.
 */
pub mod memory;
/**
 * Capability interfaces for metadata
 *  and blob storage.
 */
pub mod ports;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::access::{AccessError, ErrorKind, FileAccess, Identity, ShareAccess};
    pub use crate::crypto::{Argon2Hasher, PasswordHasher};
    pub use crate::domain::{File, NewFile, Share, User};
    pub use crate::ports::{ContentStore, FileStore, ShareStore, StoreError, UserStore};
    pub use crate::version::build_info;
}
