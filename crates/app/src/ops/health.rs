use clap::Args;

use crate::op::{Op, OpContext};
use sealdrop::state::AppState;

#[derive(Args, Debug, Clone)]
pub struct Health;

#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("invalid remote url: {0}")]
    Url(#[from] url::ParseError),
}

#[async_trait::async_trait]
impl Op for Health {
    type Error = HealthError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let mut lines = Vec::new();

        lines.push("Config:".to_string());
        match AppState::load(ctx.config_path.clone()) {
            Ok(state) => {
                lines.push(format!("  directory:    {}", state.sealdrop_dir.display()));
                lines.push("  config.toml:  OK".to_string());
                lines.push("  db.sqlite:    OK".to_string());
                lines.push("  blobs/:       OK".to_string());
                match state.load_key() {
                    Ok(_) => lines.push("  key.pem:      OK".to_string()),
                    Err(e) => lines.push(format!("  key.pem:      {}", e)),
                }
                lines.push(format!("  api_port:     {}", state.config.api_port));
            }
            Err(e) => {
                lines.push(format!("  error: {}", e));
            }
        }

        lines.push(String::new());
        lines.push(format!("Daemon ({}):", ctx.remote));

        for probe in ["livez", "readyz"] {
            let url = ctx.remote.join(&format!("/_status/{}", probe))?;
            let status = match ctx.client.get(url).send().await {
                Ok(resp) if resp.status().is_success() => "OK".to_string(),
                Ok(resp) => format!("UNHEALTHY ({})", resp.status()),
                Err(_) => "NOT REACHABLE".to_string(),
            };
            lines.push(format!("  {:<7} {}", format!("{}:", probe), status));
        }

        Ok(lines.join("\n"))
    }
}
