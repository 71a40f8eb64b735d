use clap::Args;

use common::build_info;

#[derive(Args, Debug, Clone)]
pub struct Version {
    /// Also ask the daemon at --remote for its build
    #[arg(long)]
    pub daemon: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("failed to query daemon version: {0}")]
    Remote(#[from] reqwest::Error),
    #[error("invalid remote url: {0}")]
    Url(#[from] url::ParseError),
}

#[async_trait::async_trait]
impl crate::op::Op for Version {
    type Error = VersionError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let local = build_info!().to_string();
        if !self.daemon {
            return Ok(local);
        }

        let remote: serde_json::Value = ctx
            .client
            .get(ctx.remote.join("/_status/version")?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(format!(
            "cli:    {}\ndaemon: {}",
            local,
            remote["version"].as_str().unwrap_or("unknown")
        ))
    }
}
