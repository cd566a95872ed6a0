//! Serve command - run the HTTP server.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::cli::RootArgs;

/// Arguments for the serve command.
#[derive(clap::Args)]
pub struct Args {
    #[command(flatten)]
    pub root: RootArgs,

    /// TCP address to listen on, or unix:/path (defaults to SMILE_BIND, then 127.0.0.1:8000)
    #[arg(long, value_name = "ADDR", conflicts_with = "socket")]
    pub bind: Option<String>,

    /// Unix domain socket to listen on instead of TCP
    #[arg(long, value_name = "PATH")]
    pub socket: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Executes the serve command.
pub fn run(args: Args) -> Result<()> {
    let mut config = args.root.load_config()?;
    if let Some(bind) = super::bind_override(args.bind.as_deref(), args.socket.as_ref())? {
        config = config.with_bind(bind);
    }

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    rt.block_on(smile::server::serve(&config))
}
