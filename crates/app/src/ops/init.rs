use clap::Args;

use crate::op::{Op, OpContext};
use sealdrop::state::{AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// API server port
    #[arg(long, default_value_t = 3000)]
    pub api_port: u16,

    /// Session token lifetime in seconds
    #[arg(long, default_value_t = 86400)]
    pub session_ttl_secs: u64,

    /// Directory for rolling log files (stdout only if unset)
    #[arg(long)]
    pub log_dir: Option<std::path::PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] sealdrop::state::StateError),
}

#[async_trait::async_trait]
impl Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            api_port: self.api_port,
            session_ttl_secs: self.session_ttl_secs,
            log_dir: self.log_dir.clone(),
            ..Default::default()
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        let output = format!(
            "Initialized sealdrop directory at: {}\n\
             - Database: {}\n\
             - Session key: {}\n\
             - Blobs: {}\n\
             - Config: {}\n\
             - API port: {}",
            state.sealdrop_dir.display(),
            state.db_path.display(),
            state.key_path.display(),
            state.blobs_path.display(),
            state.config_path.display(),
            state.config.api_port,
        );

        Ok(output)
    }
}
