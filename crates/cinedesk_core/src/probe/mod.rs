//! Image dimension probing for draft image fields.
//!
//! # Responsibility
//! - Resolve an image URL to its natural pixel size.
//! - Run probes as cancellable, time-bounded tasks keyed by sequence number.
//!
//! # Invariants
//! - A result is applied only if it carries the newest sequence number
//!   issued for its field.
//! - Probes never block the caller; results arrive as messages.

use crate::model::movie::{FALLBACK_IMAGE_HEIGHT, FALLBACK_IMAGE_WIDTH};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod prober;
pub mod sniff;
pub mod source;

pub type ProbeResult<T> = Result<T, ProbeError>;

/// Natural size of an image in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// CSS width for the draft, `250px` when the width is unknown.
    pub fn css_width(dimensions: Option<Self>) -> String {
        css_pixels(dimensions.map(|d| d.width), FALLBACK_IMAGE_WIDTH)
    }

    /// CSS height for the draft, `400px` when the height is unknown.
    pub fn css_height(dimensions: Option<Self>) -> String {
        css_pixels(dimensions.map(|d| d.height), FALLBACK_IMAGE_HEIGHT)
    }
}

fn css_pixels(value: Option<u32>, fallback: &str) -> String {
    match value {
        Some(pixels) if pixels > 0 => format!("{pixels}px"),
        _ => fallback.to_string(),
    }
}

/// Failure to resolve image dimensions.
#[derive(Debug)]
pub enum ProbeError {
    Http(reqwest::Error),
    Status(u16),
    Io(std::io::Error),
    InvalidDataUrl(String),
    Truncated,
    UnsupportedFormat(String),
}

impl Display for ProbeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(err) => write!(f, "image request failed: {err}"),
            Self::Status(code) => write!(f, "image request returned status {code}"),
            Self::Io(err) => write!(f, "image read failed: {err}"),
            Self::InvalidDataUrl(reason) => write!(f, "invalid data url: {reason}"),
            Self::Truncated => write!(f, "image ended before its header was complete"),
            Self::UnsupportedFormat(kind) => write!(f, "unsupported image format `{kind}`"),
        }
    }
}

impl Error for ProbeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

impl From<std::io::Error> for ProbeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
