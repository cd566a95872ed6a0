//! Command-line interface for I Need A Smile.
//!
//! Runs the server and provides maintenance commands for the database,
//! configuration and reverse-proxy setup.

/// Individual CLI command implementations.
pub mod commands;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use smile::config::Config;

/// Options shared by commands that work on an application root.
#[derive(clap::Args, Debug, Clone)]
pub struct RootArgs {
    /// Application root holding static/, smiles.db and prompt_log.txt
    /// (defaults to SMILE_ROOT, then the current directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
}

impl RootArgs {
    /// Loads configuration from the environment and applies `--root`.
    pub fn load_config(&self) -> Result<Config> {
        let config = Config::from_env()?;
        Ok(match &self.root {
            Some(root) => config.with_root(root),
            None => config,
        })
    }
}

/// Initializes logging to stderr and, optionally, to a file.
///
/// The returned guard must be kept alive for file logging to flush.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = if verbose { "smile=debug,tower_http=debug" } else { "smile=info" };

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_name = path
                .file_name()
                .context("Log file path has no file name")?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(guard)
}
