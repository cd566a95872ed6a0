//! Generate command - make one picture without the browser.

use anyhow::{Context, Result};
use colored::Colorize;

use smile::imagegen::create_provider;
use smile::service::SmileService;

use crate::cli::RootArgs;

/// Arguments for the generate command.
#[derive(clap::Args)]
pub struct Args {
    #[command(flatten)]
    pub root: RootArgs,
}

/// Executes the generate command.
pub fn run(args: Args) -> Result<()> {
    let config = args.root.load_config()?;
    let provider = create_provider(config.image_api.clone())?;
    let service = SmileService::open(config.layout.clone(), provider)?;

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    let generation = rt.block_on(service.generate())?;

    println!("{}", "Selections:".bold());
    for (category, name) in generation.selections.iter() {
        println!("  {:12} {}", format!("{category}:").dimmed(), name);
    }
    println!();
    println!("{}", "Prompt:".bold());
    println!("  {}", generation.prompt);
    println!();
    println!(
        "{} {}",
        "Saved:".bold().green(),
        config.layout.static_dir().join(&generation.image_path).display()
    );

    Ok(())
}
