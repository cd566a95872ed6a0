//! Core data models for I Need A Smile
//!
//! These describe what gets scored and rated, independent of how the
//! picture itself is produced.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the four slots a scene prompt is assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Who is in the scene.
    Actors,
    /// What they are doing.
    Activities,
    /// Where it happens.
    Areas,
    /// The prop that ties it together.
    Accessories,
}

impl Category {
    /// Every category, in prompt order.
    pub const ALL: [Category; 4] = [
        Category::Actors,
        Category::Activities,
        Category::Areas,
        Category::Accessories,
    ];

    /// The string stored in the database and used as a JSON key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Actors => "actors",
            Category::Activities => "activities",
            Category::Areas => "areas",
            Category::Accessories => "accessories",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "actors" => Ok(Category::Actors),
            "activities" => Ok(Category::Activities),
            "areas" => Ok(Category::Areas),
            "accessories" => Ok(Category::Accessories),
            other => Err(format!(
                "Unknown category: '{other}'. Expected one of: actors, activities, areas, accessories"
            )),
        }
    }
}

/// The tag chosen for each category of a single generation.
///
/// Serializes as a JSON object keyed by category name, which is also the
/// format of the `ratings.selections` column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selections(BTreeMap<Category, String>);

impl Selections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: Category, name: impl Into<String>) {
        self.0.insert(category, name.into());
    }

    pub fn get(&self, category: Category) -> Option<&str> {
        self.0.get(&category).map(String::as_str)
    }

    /// True when every category has a tag.
    pub fn is_complete(&self) -> bool {
        Category::ALL.iter().all(|c| self.0.contains_key(c))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &str)> {
        self.0.iter().map(|(c, n)| (*c, n.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Category, String)> for Selections {
    fn from_iter<I: IntoIterator<Item = (Category, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Accumulated feedback for one tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemScore {
    pub category: Category,
    pub name: String,

    /// Sum of every rating this tag has been part of
    pub total_score: i64,

    /// How many ratings contributed to `total_score`
    pub rating_count: i64,
}

impl ItemScore {
    /// Mean rating, or zero for a tag nobody has rated yet.
    pub fn average(&self) -> f64 {
        if self.rating_count > 0 {
            self.total_score as f64 / self.rating_count as f64
        } else {
            0.0
        }
    }
}

/// A single 1-5 star rating of a generated picture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub id: i64,
    pub rating: u8,
    pub selections: Selections,
    pub created_at: DateTime<Utc>,
}

/// The outcome of one successful generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub selections: Selections,
    pub prompt: String,

    /// Path relative to the `static/` directory, e.g. `generated/smile_<hex>.png`
    pub image_path: String,
}
