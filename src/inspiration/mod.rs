//! Inspiration: picking the tags a scene is built from.
//!
//! Each category draws one tag at random, weighted by how well that tag
//! has been rated before. A tag's weight is `1 + average rating`, so an
//! unrated tag still has a fair chance and a five-star favourite is up to
//! six times as likely to come back.

pub mod catalog;

use std::collections::HashMap;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::storage::{Category, Database, ItemScore, Selections};

pub use catalog::Catalog;

/// Errors that can occur while choosing inspiration.
#[derive(Debug, thiserror::Error)]
pub enum InspirationError {
    /// A category has nothing to choose from.
    #[error("No options available for {0}")]
    NoOptions(Category),

    /// Weights could not form a distribution.
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    /// Scores could not be loaded.
    #[error("Failed to load scores: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Weight used for an option when picking at random.
pub fn weight_for(score: Option<&ItemScore>) -> f64 {
    1.0 + score.map(ItemScore::average).unwrap_or(0.0)
}

/// Picks one option, weighted by its score.
///
/// Options without a score row count as unrated.
pub fn weighted_choice<'a, R: Rng + ?Sized>(
    category: Category,
    options: &'a [String],
    scores: &[ItemScore],
    rng: &mut R,
) -> Result<&'a str, InspirationError> {
    if options.is_empty() {
        return Err(InspirationError::NoOptions(category));
    }

    let by_name: HashMap<&str, &ItemScore> =
        scores.iter().map(|s| (s.name.as_str(), s)).collect();

    let weights: Vec<f64> = options
        .iter()
        .map(|option| weight_for(by_name.get(option.as_str()).copied()))
        .collect();

    let dist =
        WeightedIndex::new(&weights).map_err(|e| InspirationError::InvalidWeights(e.to_string()))?;

    Ok(options[dist.sample(rng)].as_str())
}

/// Chooses one tag for every category.
pub fn generate_inspiration<R: Rng + ?Sized>(
    db: &Database,
    catalog: &Catalog,
    rng: &mut R,
) -> Result<Selections, InspirationError> {
    let mut selections = Selections::new();

    for category in Category::ALL {
        let scores = db.item_scores(category)?;
        let choice = weighted_choice(category, catalog.options(category), &scores, rng)?;
        selections.insert(category, choice);
    }

    Ok(selections)
}

/// Builds the image prompt for a set of selections.
///
/// Missing categories render as empty strings.
pub fn build_prompt(selections: &Selections) -> String {
    let actors = selections.get(Category::Actors).unwrap_or_default();
    let activities = selections.get(Category::Activities).unwrap_or_default();
    let areas = selections.get(Category::Areas).unwrap_or_default();
    let accessories = selections.get(Category::Accessories).unwrap_or_default();

    format!(
        "Create a highly detailed, cinematic, joyful illustration. \
         Scene: {actors} {activities} {areas} with {accessories}. \
         Use a warm, whimsical palette, dynamic action, and strong character expressions. \
         Ensure the scene clearly shows the actors, activity, area, and accessory."
    )
}
