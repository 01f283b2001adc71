//! Category-partitioned catalog record.
//!
//! # Invariants
//! - Serialized form is a JSON object with exactly `topRating`, `trending`
//!   and `newRelease` array properties.
//! - A category missing from stored data, or stored as `null`, loads as an
//!   empty sequence.

use crate::model::category::Category;
use crate::model::movie::{MovieEntry, MovieId};
use serde::{Deserialize, Deserializer, Serialize};

/// Full persisted catalog state, partitioned by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogRecord {
    #[serde(deserialize_with = "null_as_empty")]
    top_rating: Vec<MovieEntry>,
    #[serde(deserialize_with = "null_as_empty")]
    trending: Vec<MovieEntry>,
    #[serde(deserialize_with = "null_as_empty")]
    new_release: Vec<MovieEntry>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<MovieEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<MovieEntry>>::deserialize(deserializer)?.unwrap_or_default())
}

impl CatalogRecord {
    /// Entries of one category in display order.
    pub fn entries(&self, category: Category) -> &[MovieEntry] {
        match category {
            Category::TopRating => &self.top_rating,
            Category::Trending => &self.trending,
            Category::NewRelease => &self.new_release,
        }
    }

    /// Replaces the whole sequence of one category.
    pub fn set_entries(&mut self, category: Category, entries: Vec<MovieEntry>) {
        match category {
            Category::TopRating => self.top_rating = entries,
            Category::Trending => self.trending = entries,
            Category::NewRelease => self.new_release = entries,
        }
    }

    /// Returns a copy of `self` where only `category` holds `entries`.
    pub fn with_entries(&self, category: Category, entries: Vec<MovieEntry>) -> Self {
        let mut next = self.clone();
        next.set_entries(category, entries);
        next
    }

    pub fn find(&self, category: Category, id: MovieId) -> Option<&MovieEntry> {
        self.entries(category).iter().find(|entry| entry.id == id)
    }

    /// Largest id over all categories.
    pub fn max_id(&self) -> Option<MovieId> {
        Category::ALL
            .iter()
            .flat_map(|category| self.entries(*category))
            .map(|entry| entry.id)
            .max()
    }

    /// Total entries over all categories.
    pub fn len(&self) -> usize {
        Category::ALL
            .iter()
            .map(|category| self.entries(*category).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
