//! Apache command - print a reverse-proxy vhost for this server.

use anyhow::Result;
use std::path::PathBuf;

use smile::config::Config;
use smile::proxy::render_apache_vhost;

/// Arguments for the apache command.
#[derive(clap::Args)]
pub struct Args {
    /// Public host name for the vhost
    #[arg(long, value_name = "NAME")]
    pub server_name: String,

    /// TCP address the server listens on, or unix:/path (defaults to SMILE_BIND)
    #[arg(long, value_name = "ADDR", conflicts_with = "socket")]
    pub bind: Option<String>,

    /// Unix domain socket the server listens on
    #[arg(long, value_name = "PATH")]
    pub socket: Option<PathBuf>,
}

/// Executes the apache command.
pub fn run(args: Args) -> Result<()> {
    let bind = match super::bind_override(args.bind.as_deref(), args.socket.as_ref())? {
        Some(bind) => bind,
        None => Config::from_env()?.bind,
    };

    print!("{}", render_apache_vhost(&args.server_name, &bind));
    Ok(())
}
