//! Init command - create the on-disk layout.

use anyhow::Result;
use colored::Colorize;

use smile::inspiration::Catalog;
use smile::service::init_layout;

use crate::cli::RootArgs;

/// Arguments for the init command.
#[derive(clap::Args)]
pub struct Args {
    #[command(flatten)]
    pub root: RootArgs,
}

/// Executes the init command.
///
/// Safe to run repeatedly; existing scores are never reset.
pub fn run(args: Args) -> Result<()> {
    let config = args.root.load_config()?;
    let layout = &config.layout;

    let db = init_layout(layout, &Catalog::builtin())?;

    println!("{}", "I Need A Smile is ready".bold().green());
    println!();
    println!("  {}  {}", "Root:       ".dimmed(), layout.root.display());
    println!("  {}  {}", "Generated:  ".dimmed(), layout.generated_dir().display());
    println!("  {}  {}", "Album:      ".dimmed(), layout.album_dir().display());
    println!("  {}  {}", "Database:   ".dimmed(), layout.db_path().display());
    println!("  {}  {}", "Prompt log: ".dimmed(), layout.prompt_log_path().display());
    println!();
    println!("  Tags known:    {}", db.item_count()?);
    println!("  Ratings so far: {}", db.rating_count()?);

    Ok(())
}
