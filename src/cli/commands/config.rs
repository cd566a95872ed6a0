//! Config command - show the resolved configuration.

use anyhow::Result;
use colored::Colorize;

use smile::config::mask_secret;

use crate::cli::RootArgs;

/// Arguments for the config command.
#[derive(clap::Args)]
pub struct Args {
    #[command(flatten)]
    pub root: RootArgs,
}

/// Executes the config command.
pub fn run(args: Args) -> Result<()> {
    let config = args.root.load_config()?;
    let api = &config.image_api;

    println!("{}", "I Need A Smile Configuration".bold());
    println!();
    println!("  {}  {}", "Root:     ".dimmed(), config.layout.root.display());
    println!("  {}  {}", "Bind:     ".dimmed(), config.bind);
    println!("  {}  {}", "API URL:  ".dimmed(), api.api_url);
    println!("  {}  {}", "Model:    ".dimmed(), api.model);
    println!("  {}  {}", "Size:     ".dimmed(), api.size);

    let key = match &api.api_key {
        Some(key) => mask_secret(key).normal(),
        None => "not set (SMILE_IMAGE_API_KEY or OPENAI_API_KEY)".red(),
    };
    println!("  {}  {}", "API key:  ".dimmed(), key);

    let secret = if config.uses_default_secret() {
        "default (set SMILE_SECRET)".yellow()
    } else {
        "custom".green()
    };
    println!("  {}  {}", "Secret:   ".dimmed(), secret);

    Ok(())
}
