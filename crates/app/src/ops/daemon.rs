use std::time::Duration;

use clap::{Args, ValueEnum};

use crate::op::{Op, OpContext};
use sealdrop::state::AppState;
use sealdrop::{spawn_service, ServiceConfig};
use sealdrop_object_store::ObjectStoreConfig;

/// Content backend selectable from the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BlobStoreType {
    /// Process memory, lost on exit
    Memory,
    /// The blobs/ directory or the configured local path
    Local,
    /// S3-compatible object storage
    S3,
}

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override the configured API port
    #[arg(long)]
    pub api_port: Option<u16>,

    /// Override the configured content backend
    #[arg(long, value_enum)]
    pub blob_store: Option<BlobStoreType>,

    /// S3 endpoint URL (required for --blob-store s3)
    #[arg(long)]
    pub s3_endpoint: Option<String>,

    /// S3 bucket name (required for --blob-store s3)
    #[arg(long)]
    pub s3_bucket: Option<String>,

    /// S3 access key (can also use SEALDROP_S3_ACCESS_KEY env var)
    #[arg(long, env = "SEALDROP_S3_ACCESS_KEY")]
    pub s3_access_key: Option<String>,

    /// S3 secret key (can also use SEALDROP_S3_SECRET_KEY env var)
    #[arg(long, env = "SEALDROP_S3_SECRET_KEY", hide_env_values = true)]
    pub s3_secret_key: Option<String>,

    /// S3 region (optional, defaults to us-east-1)
    #[arg(long)]
    pub s3_region: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("state error: {0}")]
    StateError(#[from] sealdrop::state::StateError),

    #[error("missing required S3 configuration: {0}")]
    MissingS3Config(String),
}

impl Daemon {
    /// Resolve the content backend: command line first, then config.toml
    fn build_blob_store_config(&self, state: &AppState) -> Result<ObjectStoreConfig, DaemonError> {
        let Some(kind) = self.blob_store else {
            return Ok(state.blob_store());
        };

        match kind {
            BlobStoreType::Memory => Ok(ObjectStoreConfig::Memory),

            BlobStoreType::Local => match state.blob_store() {
                local @ ObjectStoreConfig::Local { .. } => Ok(local),
                _ => Ok(ObjectStoreConfig::Local {
                    path: state.blobs_path.clone(),
                }),
            },

            BlobStoreType::S3 => {
                let endpoint = self
                    .s3_endpoint
                    .clone()
                    .ok_or_else(|| DaemonError::MissingS3Config("--s3-endpoint".to_string()))?;
                let bucket = self
                    .s3_bucket
                    .clone()
                    .ok_or_else(|| DaemonError::MissingS3Config("--s3-bucket".to_string()))?;
                let access_key = self.s3_access_key.clone().ok_or_else(|| {
                    DaemonError::MissingS3Config(
                        "--s3-access-key or SEALDROP_S3_ACCESS_KEY".to_string(),
                    )
                })?;
                let secret_key = self.s3_secret_key.clone().ok_or_else(|| {
                    DaemonError::MissingS3Config(
                        "--s3-secret-key or SEALDROP_S3_SECRET_KEY".to_string(),
                    )
                })?;

                Ok(ObjectStoreConfig::S3 {
                    endpoint,
                    access_key,
                    secret_key,
                    bucket,
                    region: self.s3_region.clone(),
                })
            }
        }
    }
}

#[async_trait::async_trait]
impl Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        let session_key = state.load_key()?;
        let blob_store = self.build_blob_store_config(&state)?;
        let config = &state.config;

        let service_config = ServiceConfig {
            api_port: self.api_port.unwrap_or(config.api_port),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            max_upload_bytes: config.max_upload_bytes,
            sqlite_path: Some(state.db_path.clone()),
            blob_store,
            session_key,
            session_ttl: Duration::from_secs(config.session_ttl_secs),
            password: config.password,
            log_level: config.log_level()?,
            log_dir: config.log_dir.clone(),
        };

        spawn_service(&service_config).await;
        Ok("daemon ended".to_string())
    }
}
