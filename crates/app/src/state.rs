use std::{fs, path::PathBuf};

use common::crypto::PasswordParams;
use serde::{Deserialize, Serialize};
use sealdrop_object_store::ObjectStoreConfig;

use crate::daemon::session::SessionKey;

pub const APP_NAME: &str = "sealdrop";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DB_FILE_NAME: &str = "db.sqlite";
pub const KEY_FILE_NAME: &str = "key.pem";
pub const BLOBS_DIR_NAME: &str = "blobs";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Port for the API server
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Default log level, overridable through RUST_LOG
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for daily rolling log files (stdout only if unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// Lifetime of an issued session token
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    /// Upper bound on a single request, uploads included
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Largest accepted request body
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Argon2id cost parameters for new password digests
    #[serde(default)]
    pub password: PasswordParams,
    /// Where file content lives (defaults to the blobs/ directory)
    #[serde(default)]
    pub blob_store: Option<ObjectStoreConfig>,
}

fn default_api_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_session_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_max_upload_bytes() -> usize {
    500 * 1024 * 1024
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            log_level: default_log_level(),
            log_dir: None,
            session_ttl_secs: default_session_ttl_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            max_upload_bytes: default_max_upload_bytes(),
            password: PasswordParams::default(),
            blob_store: None,
        }
    }
}

impl AppConfig {
    pub fn log_level(&self) -> Result<tracing::Level, StateError> {
        self.log_level
            .parse()
            .map_err(|_| StateError::InvalidConfig(format!("unknown log level: {}", self.log_level)))
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the sealdrop directory (~/.sealdrop)
    pub sealdrop_dir: PathBuf,
    /// Path to the SQLite database
    pub db_path: PathBuf,
    /// Path to the session signing key
    pub key_path: PathBuf,
    /// Path to the blobs directory
    pub blobs_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the sealdrop directory path (custom or default ~/.sealdrop)
    pub fn sealdrop_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let sealdrop_dir = Self::sealdrop_dir(custom_path)?;

        if sealdrop_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&sealdrop_dir)?;

        let blobs_path = sealdrop_dir.join(BLOBS_DIR_NAME);
        fs::create_dir_all(&blobs_path)?;

        let key = SessionKey::generate().map_err(|e| StateError::InvalidKey(e.to_string()))?;
        let key_path = sealdrop_dir.join(KEY_FILE_NAME);
        fs::write(&key_path, key.to_pem())?;

        let mut config = config.unwrap_or_default();
        if config.blob_store.is_none() {
            config.blob_store = Some(ObjectStoreConfig::Local {
                path: blobs_path.clone(),
            });
        }
        let config_path = sealdrop_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        // Migrations run when the daemon opens it
        let db_path = sealdrop_dir.join(DB_FILE_NAME);
        fs::write(&db_path, "")?;

        Ok(Self {
            sealdrop_dir,
            db_path,
            key_path,
            blobs_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the sealdrop directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let sealdrop_dir = Self::sealdrop_dir(custom_path)?;

        if !sealdrop_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let db_path = sealdrop_dir.join(DB_FILE_NAME);
        let key_path = sealdrop_dir.join(KEY_FILE_NAME);
        let blobs_path = sealdrop_dir.join(BLOBS_DIR_NAME);
        let config_path = sealdrop_dir.join(CONFIG_FILE_NAME);

        if !db_path.exists() {
            return Err(StateError::MissingFile(DB_FILE_NAME.to_string()));
        }
        if !key_path.exists() {
            return Err(StateError::MissingFile(KEY_FILE_NAME.to_string()));
        }
        if !blobs_path.exists() {
            return Err(StateError::MissingFile(format!("{}/", BLOBS_DIR_NAME)));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            sealdrop_dir,
            db_path,
            key_path,
            blobs_path,
            config_path,
            config,
        })
    }

    /// Load the session signing key from the key file
    pub fn load_key(&self) -> Result<SessionKey, StateError> {
        let pem = fs::read_to_string(&self.key_path)?;
        SessionKey::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))
    }

    /// The configured content backend, falling back to the blobs directory
    pub fn blob_store(&self) -> ObjectStoreConfig {
        self.config
            .blob_store
            .clone()
            .unwrap_or_else(|| ObjectStoreConfig::Local {
                path: self.blobs_path.clone(),
            })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("sealdrop directory not initialized. Run 'sealdrop init' first")]
    NotInitialized,

    #[error("sealdrop directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_load() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("state");

        let state = AppState::init(Some(dir.clone()), None).unwrap();
        assert!(state.db_path.exists());
        assert!(state.blobs_path.is_dir());
        assert_eq!(
            state.config.blob_store,
            Some(ObjectStoreConfig::Local {
                path: dir.join(BLOBS_DIR_NAME)
            })
        );

        let loaded = AppState::load(Some(dir)).unwrap();
        assert_eq!(loaded.config, state.config);
        loaded.load_key().unwrap();
    }

    #[test]
    fn test_init_twice_fails() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("state");

        AppState::init(Some(dir.clone()), None).unwrap();
        assert!(matches!(
            AppState::init(Some(dir), None),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_load_uninitialized() {
        let temp = tempfile::tempdir().unwrap();
        assert!(matches!(
            AppState::load(Some(temp.path().join("missing"))),
            Err(StateError::NotInitialized)
        ));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str("api_port = 4000\n").unwrap();
        assert_eq!(config.api_port, 4000);
        assert_eq!(config.session_ttl_secs, 86400);
        assert_eq!(config.password, PasswordParams::default());
        assert_eq!(config.log_level().unwrap(), tracing::Level::INFO);
    }

    #[test]
    fn test_bad_log_level() {
        let config = AppConfig {
            log_level: "loud".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.log_level(), Err(StateError::InvalidConfig(_))));
    }
}
