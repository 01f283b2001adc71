//! Admin form state.
//!
//! # Responsibility
//! - Hold the in-progress movie values and the optional edit target.
//! - Map named field updates (text or checkbox) onto entry attributes.
//!
//! # Invariants
//! - No required-field validation: empty strings are legal values.
//! - The draft never assigns ids; `to_entry` receives one from the caller.

use crate::model::category::Category;
use crate::model::movie::{MovieEntry, MovieId};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Entry attributes addressable by name from a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftField {
    Title,
    Image,
    HoverImage,
    Alt,
    AgeRating,
    Duration,
    Genre,
    NewEpisode,
    Top10,
    ImageWidth,
    ImageHeight,
    BgColor,
    TextColor,
    TitleSize,
    CardClassName,
}

impl DraftField {
    pub const ALL: [DraftField; 15] = [
        Self::Title,
        Self::Image,
        Self::HoverImage,
        Self::Alt,
        Self::AgeRating,
        Self::Duration,
        Self::Genre,
        Self::NewEpisode,
        Self::Top10,
        Self::ImageWidth,
        Self::ImageHeight,
        Self::BgColor,
        Self::TextColor,
        Self::TitleSize,
        Self::CardClassName,
    ];

    /// Stored attribute name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Image => "image",
            Self::HoverImage => "hoverImage",
            Self::Alt => "alt",
            Self::AgeRating => "ageRating",
            Self::Duration => "duration",
            Self::Genre => "genre",
            Self::NewEpisode => "newEpisode",
            Self::Top10 => "top10",
            Self::ImageWidth => "imageWidth",
            Self::ImageHeight => "imageHeight",
            Self::BgColor => "bgColor",
            Self::TextColor => "textColor",
            Self::TitleSize => "titleSize",
            Self::CardClassName => "cardClassName",
        }
    }

    pub fn is_flag(self) -> bool {
        matches!(self, Self::NewEpisode | Self::Top10)
    }
}

impl Display for DraftField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DraftField {
    type Err = DraftError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let name = value.trim();
        if name == "id" {
            return Err(DraftError::ReadOnlyField(name.to_string()));
        }
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == name)
            .ok_or_else(|| DraftError::UnknownField(name.to_string()))
    }
}

/// One form input event value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInput {
    Text(String),
    Checkbox(bool),
}

impl FieldInput {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    fn into_flag(self) -> bool {
        match self {
            Self::Checkbox(checked) => checked,
            Self::Text(value) => matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "on" | "yes"
            ),
        }
    }

    fn into_text(self) -> String {
        match self {
            Self::Text(value) => value,
            Self::Checkbox(checked) => checked.to_string(),
        }
    }
}

/// Draft-level error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    /// No entry attribute has this name.
    UnknownField(String),
    /// The attribute exists but is assigned by the store.
    ReadOnlyField(String),
}

impl Display for DraftError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField(name) => write!(f, "unknown movie field `{name}`"),
            Self::ReadOnlyField(name) => write!(f, "movie field `{name}` is read-only"),
        }
    }
}

impl Error for DraftError {}

/// Entry being edited, bound to the category it was seeded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditTarget {
    pub id: MovieId,
    pub category: Category,
}

/// Form state holder: draft values plus create/edit mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    values: MovieEntry,
    editing: Option<EditTarget>,
}

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> &MovieEntry {
        &self.values
    }

    /// `None` in create mode.
    pub fn editing(&self) -> Option<EditTarget> {
        self.editing
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Sets one attribute by its stored name.
    pub fn set_field(&mut self, name: &str, input: FieldInput) -> Result<DraftField, DraftError> {
        let field = name.parse::<DraftField>()?;
        self.set(field, input);
        Ok(field)
    }

    /// Sets one attribute, coercing the input to the attribute's type.
    pub fn set(&mut self, field: DraftField, input: FieldInput) {
        if field.is_flag() {
            let flag = input.into_flag();
            match field {
                DraftField::NewEpisode => self.values.new_episode = flag,
                _ => self.values.top10 = flag,
            }
            return;
        }

        let text = input.into_text();
        let v = &mut self.values;
        match field {
            DraftField::Title => v.title = text,
            DraftField::Image => v.image = text,
            DraftField::HoverImage => v.hover_image = text,
            DraftField::Alt => v.alt = text,
            DraftField::AgeRating => v.age_rating = text,
            DraftField::Duration => v.duration = text,
            DraftField::Genre => v.genre = text,
            DraftField::ImageWidth => v.image_width = text,
            DraftField::ImageHeight => v.image_height = text,
            DraftField::BgColor => v.bg_color = text,
            DraftField::TextColor => v.text_color = text,
            DraftField::TitleSize => v.title_size = text,
            DraftField::CardClassName => v.card_class_name = text,
            DraftField::NewEpisode | DraftField::Top10 => {}
        }
    }

    /// Commits a probed image URL together with its CSS dimensions.
    pub fn set_image(&mut self, field: DraftField, url: String, width: String, height: String) {
        self.set(field, FieldInput::Text(url));
        self.values.image_width = width;
        self.values.image_height = height;
    }

    /// Copies every attribute of `entry` and switches to edit mode.
    pub fn seed_from(&mut self, entry: &MovieEntry, category: Category) {
        self.values = entry.clone();
        self.editing = Some(EditTarget {
            id: entry.id,
            category,
        });
    }

    /// Back to blank create mode.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Entry to persist under `id`, with submit defaults applied.
    pub fn to_entry(&self, id: MovieId) -> MovieEntry {
        self.values.finalized(id)
    }
}
