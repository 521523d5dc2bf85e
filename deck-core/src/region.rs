//! Region keys - the names of the rectangles a layout template defines.
//!
//! The vocabulary is fixed: `title`, `content`, `content{N}` (columns),
//! `image`, `line` (timeline spine), `item{N}C` (timeline marker) and
//! `item{N}T` (timeline text). Keys serialize as these strings so measured
//! layouts and stored slide layouts share one format.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DeckError;

/// A named region within a slide layout.
///
/// Ordering follows slide reading order: title first, then content blocks,
/// image, the timeline spine, then timeline markers and timeline texts, each
/// by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RegionKey {
    /// Slide title.
    Title,
    /// Single content block.
    Content,
    /// One of several content columns.
    Column(usize),
    /// Slide image.
    Image,
    /// Vertical spine of a timeline.
    Line,
    /// Numbered marker of a timeline item.
    Marker(usize),
    /// Text of a timeline item.
    ItemText(usize),
}

impl RegionKey {
    /// Whether this region holds body content (a `content` block or column).
    #[must_use]
    pub fn is_content_block(&self) -> bool {
        matches!(self, Self::Content | Self::Column(_))
    }

    /// Whether this region holds text of a timeline item.
    #[must_use]
    pub fn is_item_text(&self) -> bool {
        matches!(self, Self::ItemText(_))
    }

    /// Whether this region carries text whose size the scale calculator
    /// should consider.
    #[must_use]
    pub fn carries_body_text(&self) -> bool {
        self.is_content_block() || self.is_item_text()
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => f.write_str("title"),
            Self::Content => f.write_str("content"),
            Self::Column(n) => write!(f, "content{n}"),
            Self::Image => f.write_str("image"),
            Self::Line => f.write_str("line"),
            Self::Marker(n) => write!(f, "item{n}C"),
            Self::ItemText(n) => write!(f, "item{n}T"),
        }
    }
}

impl FromStr for RegionKey {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DeckError::InvalidRegionKey(s.to_string());
        match s {
            "title" => return Ok(Self::Title),
            "content" => return Ok(Self::Content),
            "image" => return Ok(Self::Image),
            "line" => return Ok(Self::Line),
            _ => {}
        }

        if let Some(index) = s.strip_prefix("content") {
            return parse_index(index).map(Self::Column).ok_or_else(invalid);
        }

        if let Some(rest) = s.strip_prefix("item") {
            if let Some(index) = rest.strip_suffix('C') {
                return parse_index(index).map(Self::Marker).ok_or_else(invalid);
            }
            if let Some(index) = rest.strip_suffix('T') {
                return parse_index(index).map(Self::ItemText).ok_or_else(invalid);
            }
        }

        Err(invalid())
    }
}

impl TryFrom<String> for RegionKey {
    type Error = DeckError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RegionKey> for String {
    fn from(key: RegionKey) -> Self {
        key.to_string()
    }
}

fn parse_index(digits: &str) -> Option<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
