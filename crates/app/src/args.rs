pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "sealdrop")]
#[command(about = "Access-controlled storage for end-to-end encrypted file sharing")]
pub struct Args {
    /// Base URL of a running daemon
    #[arg(long, global = true, default_value = "http://localhost:3000")]
    pub remote: Url,

    /// Path to the sealdrop config directory (defaults to ~/.sealdrop)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
