//! Movie entry record.
//!
//! # Responsibility
//! - Define the persisted attribute set of one catalog item.
//! - Own blank-form and submit-time defaults.
//!
//! # Invariants
//! - JSON attribute names match the stored blob (`hoverImage`, `top10`, ...).
//! - Missing attributes in stored data load as blank defaults.

use serde::{Deserialize, Serialize};

/// Entry identifier: creation time in Unix epoch milliseconds.
pub type MovieId = i64;

pub const DEFAULT_IMAGE_URL: &str = "default_image_url";
pub const DEFAULT_HOVER_IMAGE_URL: &str = "default_hover_image_url";
pub const FALLBACK_IMAGE_WIDTH: &str = "250px";
pub const FALLBACK_IMAGE_HEIGHT: &str = "400px";
pub const CARD_CLASS_NAME: &str = "max-w-[180px] sm:max-w-[280px]";

const BLANK_IMAGE_WIDTH: &str = "100%";
const BLANK_IMAGE_HEIGHT: &str = "190px";
const BLANK_BG_COLOR: &str = "bg-[#181A1C]";
const BLANK_TEXT_COLOR: &str = "text-white";
const BLANK_TITLE_SIZE: &str = "text-lg";

/// One catalog item and its display attributes.
///
/// Styling fields (`image_width` .. `card_class_name`) are pass-through
/// values; the core only defaults them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MovieEntry {
    pub id: MovieId,
    pub title: String,
    pub image: String,
    pub hover_image: String,
    pub alt: String,
    pub age_rating: String,
    pub duration: String,
    pub genre: String,
    pub new_episode: bool,
    #[serde(rename = "top10")]
    pub top10: bool,
    pub image_width: String,
    pub image_height: String,
    pub bg_color: String,
    pub text_color: String,
    pub title_size: String,
    pub card_class_name: String,
}

impl Default for MovieEntry {
    /// Blank form values with id `0`.
    fn default() -> Self {
        Self {
            id: 0,
            title: String::new(),
            image: String::new(),
            hover_image: String::new(),
            alt: String::new(),
            age_rating: String::new(),
            duration: String::new(),
            genre: String::new(),
            new_episode: false,
            top10: false,
            image_width: BLANK_IMAGE_WIDTH.to_string(),
            image_height: BLANK_IMAGE_HEIGHT.to_string(),
            bg_color: BLANK_BG_COLOR.to_string(),
            text_color: BLANK_TEXT_COLOR.to_string(),
            title_size: BLANK_TITLE_SIZE.to_string(),
            card_class_name: CARD_CLASS_NAME.to_string(),
        }
    }
}

impl MovieEntry {
    /// Convenience constructor for a blank entry with a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Returns a copy carrying `id` with submit-time defaults applied.
    ///
    /// Empty image URLs and dimensions fall back to fixed placeholders; the
    /// card class is always reset to the catalog-wide value.
    pub fn finalized(&self, id: MovieId) -> Self {
        let mut entry = self.clone();
        entry.id = id;
        fill_if_empty(&mut entry.image, DEFAULT_IMAGE_URL);
        fill_if_empty(&mut entry.hover_image, DEFAULT_HOVER_IMAGE_URL);
        fill_if_empty(&mut entry.image_width, FALLBACK_IMAGE_WIDTH);
        fill_if_empty(&mut entry.image_height, FALLBACK_IMAGE_HEIGHT);
        entry.card_class_name = CARD_CLASS_NAME.to_string();
        entry
    }
}

fn fill_if_empty(value: &mut String, fallback: &str) {
    if value.is_empty() {
        *value = fallback.to_string();
    }
}
