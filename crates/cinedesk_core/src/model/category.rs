//! Fixed catalog partitions.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// One of the three fixed catalog partitions.
///
/// Serialized with the storage wire names (`topRating`, `trending`,
/// `newRelease`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    #[default]
    TopRating,
    Trending,
    NewRelease,
}

impl Category {
    /// All categories in display (tab) order.
    pub const ALL: [Category; 3] = [Self::TopRating, Self::Trending, Self::NewRelease];

    /// Storage wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopRating => "topRating",
            Self::Trending => "trending",
            Self::NewRelease => "newRelease",
        }
    }

    /// Short tab label.
    pub fn label(self) -> &'static str {
        match self {
            Self::TopRating => "Top Rating",
            Self::Trending => "Trending",
            Self::NewRelease => "New Release",
        }
    }

    /// Heading shown above the entry table.
    pub fn heading(self) -> &'static str {
        match self {
            Self::TopRating => "Top Rating Movies",
            Self::Trending => "Trending Movies",
            Self::NewRelease => "New Release Movies",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when text does not name a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCategoryError(pub String);

impl Display for ParseCategoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown category `{}`; expected topRating|trending|newRelease",
            self.0
        )
    }
}

impl Error for ParseCategoryError {}

impl FromStr for Category {
    type Err = ParseCategoryError;

    /// Accepts wire names plus kebab/snake spellings, case-insensitively.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let folded = value
            .trim()
            .chars()
            .filter(|ch| *ch != '-' && *ch != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match folded.as_str() {
            "toprating" => Ok(Self::TopRating),
            "trending" => Ok(Self::Trending),
            "newrelease" => Ok(Self::NewRelease),
            _ => Err(ParseCategoryError(value.trim().to_string())),
        }
    }
}
