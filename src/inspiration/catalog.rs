//! Built-in tag catalog.

use std::collections::BTreeMap;

use crate::storage::Category;

const ACTORS: &[&str] = &[
    "a wise owl",
    "a grumpy cat",
    "a dirty kitten",
    "a tiny skunk",
    "a sleepy possum",
    "a suspicious chicken",
    "a hyperactive squirrel",
    "a retired wizard",
    "two penguins in love",
];

const ACTIVITIES: &[&str] = &[
    "vaping dramatically",
    "sleeping on the job",
    "falling off a ladder",
    "slipping on a banana peel",
    "laughing uncontrollably",
    "causing mischief",
    "snowboarding badly",
    "fishing for compliments",
    "teaching a yoga class",
];

const AREAS: &[&str] = &[
    "in a tiny car",
    "at a karaoke bar",
    "on a sunny beach",
    "outside a corner store",
    "at a rock concert",
    "in a laundromat",
    "on the surface of the moon",
];

const ACCESSORIES: &[&str] = &[
    "a pack of candy cigarettes",
    "a tiny top hat",
    "a single cowboy boot",
    "a glowing mushroom",
    "a speech bubble that says 'nope'",
    "a water pistol",
    "a wagon wheel",
    "a birthday cake",
];

/// The set of tags each category can draw from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: BTreeMap<Category, Vec<String>>,
}

impl Catalog {
    /// The tags the app ships with.
    pub fn builtin() -> Self {
        let table: [(Category, &[&str]); 4] = [
            (Category::Actors, ACTORS),
            (Category::Activities, ACTIVITIES),
            (Category::Areas, AREAS),
            (Category::Accessories, ACCESSORIES),
        ];

        let entries = table
            .into_iter()
            .map(|(category, tags)| (category, tags.iter().map(|t| t.to_string()).collect()))
            .collect();

        Self { entries }
    }

    /// Build a catalog from explicit tag lists. Categories left out have no options.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Category, Vec<String>)>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn options(&self, category: Category) -> &[String] {
        self.entries
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every (category, tag) pair, for seeding the database.
    pub fn items(&self) -> impl Iterator<Item = (Category, &str)> {
        self.entries
            .iter()
            .flat_map(|(category, tags)| tags.iter().map(move |t| (*category, t.as_str())))
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
