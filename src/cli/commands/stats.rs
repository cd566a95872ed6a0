//! Stats command - show how each tag is rated.

use anyhow::Result;
use colored::Colorize;

use smile::storage::{Category, Database, ItemScore};

use crate::cli::RootArgs;

/// Arguments for the stats command.
#[derive(clap::Args)]
pub struct Args {
    #[command(flatten)]
    pub root: RootArgs,

    /// Only show one category (actors, activities, areas, accessories)
    #[arg(long, short)]
    pub category: Option<Category>,

    /// Number of recent ratings to list
    #[arg(long, default_value = "5")]
    pub recent: usize,
}

/// Sorts scores best first; ties keep the more-rated tag first, then by name.
pub(crate) fn rank(scores: &mut [ItemScore]) {
    scores.sort_by(|a, b| {
        b.average()
            .total_cmp(&a.average())
            .then(b.rating_count.cmp(&a.rating_count))
            .then(a.name.cmp(&b.name))
    });
}

/// Executes the stats command.
pub fn run(args: Args) -> Result<()> {
    let config = args.root.load_config()?;
    let db_path = config.layout.db_path();
    if !db_path.exists() {
        println!(
            "{}",
            format!("No database at {}. Run 'smile init' first.", db_path.display()).yellow()
        );
        return Ok(());
    }
    let db = Database::open(&db_path)?;

    let categories: Vec<Category> = match args.category {
        Some(c) => vec![c],
        None => Category::ALL.to_vec(),
    };

    for category in categories {
        let mut scores = db.item_scores(category)?;
        rank(&mut scores);

        println!("{}", category.to_string().bold().cyan());
        for score in scores {
            let avg = if score.rating_count > 0 {
                format!("{:.2}", score.average()).green()
            } else {
                "-".dimmed()
            };
            println!(
                "  {:>5}  {:>4} ratings  {}",
                avg,
                score.rating_count,
                score.name
            );
        }
        println!();
    }

    let recent = db.recent_ratings(args.recent)?;
    if !recent.is_empty() {
        println!("{}", "Recent ratings:".bold());
        for rating in recent {
            let tags: Vec<&str> = rating.selections.iter().map(|(_, n)| n).collect();
            println!(
                "  {}  {}  {}",
                rating.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                "★".repeat(rating.rating as usize).yellow(),
                tags.join(" / ")
            );
        }
    }

    Ok(())
}
