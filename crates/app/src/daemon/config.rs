use std::path::PathBuf;
use std::time::Duration;

use common::crypto::PasswordParams;
use sealdrop_object_store::ObjectStoreConfig;

use super::session::SessionKey;

#[derive(Debug)]
pub struct Config {
    // http server configuration
    /// Port for the API server
    pub api_port: u16,
    /// Upper bound on a single request
    pub request_timeout: Duration,
    /// Largest accepted request body
    pub max_upload_bytes: usize,

    // data store configuration
    /// a path to a sqlite database, if not set then an
    ///  in-memory database will be used
    pub sqlite_path: Option<PathBuf>,
    /// File content backend
    pub blob_store: ObjectStoreConfig,

    // identity configuration
    /// Key used to sign session tokens
    pub session_key: SessionKey,
    pub session_ttl: Duration,
    pub password: PasswordParams,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}
