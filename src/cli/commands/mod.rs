//! CLI commands for I Need A Smile.
//!
//! Each submodule implements a single CLI command with its argument
//! parsing and execution logic.

/// Print an Apache vhost matching the bind target.
pub mod apache;

/// Show the resolved configuration.
pub mod config;

/// Generate one picture from the terminal.
pub mod generate;

/// Create the directory layout and seed the database.
pub mod init;

/// Run the HTTP server.
pub mod serve;

/// Show which tags people like.
pub mod stats;

use anyhow::{anyhow, Result};
use std::path::PathBuf;

use smile::config::Bind;

/// Resolves `--bind` / `--socket` into a bind target, if either was given.
pub(crate) fn bind_override(bind: Option<&str>, socket: Option<&PathBuf>) -> Result<Option<Bind>> {
    if let Some(path) = socket {
        return Ok(Some(Bind::Unix(path.clone())));
    }
    bind.map(|b| b.parse::<Bind>().map_err(|e| anyhow!(e)))
        .transpose()
}
