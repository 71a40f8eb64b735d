//! SQLite + Object Storage Backend
//!
//! Concrete adapters for the sealdrop storage ports:
//!
//! - [`Database`]: SQLite metadata store implementing `FileStore`,
//!   `ShareStore` and `UserStore`. Deleting a file cascades to its shares.
//! - [`Storage`]: content store over S3/MinIO, the local filesystem or
//!   memory, implementing `ContentStore`.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use sealdrop_object_store::{Database, ObjectStoreConfig, Storage};
//!
//! # async fn example() -> Result<(), sealdrop_object_store::StorageSetupError> {
//! let db = Database::new(Path::new("/tmp/sealdrop/db.sqlite")).await?;
//! let storage = Storage::new(ObjectStoreConfig::Local {
//!     path: "/tmp/sealdrop/blobs".into(),
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

mod database;
mod error;
mod files;
mod shares;
mod storage;
mod users;

pub use database::Database;
pub use error::{Result, StorageSetupError};
pub use storage::{ObjectStoreConfig, Storage};
