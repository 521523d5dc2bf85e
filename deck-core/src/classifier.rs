//! Content classification - choosing a layout archetype for a slide.
//!
//! The choice depends only on the slide's type, whether it carries an image,
//! how dense its parsed content is and the slide's position in the deck, so
//! it can be recomputed anywhere (editor, exporter, headless host) with the
//! same answer.

use serde::{Deserialize, Serialize};

use crate::content::{parse_content, text_length, ParsedContent};
use crate::slide::{RegionMap, Slide, SlideType};

/// Default title band height of the standard text layout.
pub const DEFAULT_TITLE_HEIGHT: f64 = 0.15;

/// How much body text a slide carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentDensity {
    /// No items.
    Empty,
    /// Up to 3 items and under 200 characters.
    Sparse,
    /// Up to 6 items and under 500 characters.
    Normal,
    /// Up to 9 items and under 800 characters.
    Dense,
    /// Anything larger.
    VeryDense,
}

impl ContentDensity {
    /// Rate parsed content.
    #[must_use]
    pub fn of(content: &ParsedContent) -> Self {
        let items = content.total_items();
        let chars = content.total_chars();
        if items == 0 {
            Self::Empty
        } else if items <= 3 && chars < 200 {
            Self::Sparse
        } else if items <= 6 && chars < 500 {
            Self::Normal
        } else if items <= 9 && chars < 800 {
            Self::Dense
        } else {
            Self::VeryDense
        }
    }
}

/// A layout archetype together with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "params", rename_all = "kebab-case")]
pub enum LayoutChoice {
    /// Large centered title, optional small image below.
    TitleSpecial {
        /// Whether the slide has an image.
        #[serde(rename = "hasImage", default)]
        has_image: bool,
    },
    /// Regions supplied by the slide itself.
    Coordinate {
        /// Region positions from the slide's layout.
        #[serde(default)]
        positions: RegionMap,
    },
    /// Title, wide image, then content underneath.
    ImageContentStack,
    /// Large image beside a narrow text column.
    ImageFocus {
        /// Image on the left, text on the right.
        #[serde(rename = "isImageLeft", default)]
        is_image_left: bool,
    },
    /// Image and text split roughly in half.
    AlternatingSplit {
        /// Image on the left, text on the right.
        #[serde(rename = "isImageLeft", default)]
        is_image_left: bool,
    },
    /// Body text in side-by-side columns.
    MultiColumn {
        /// Number of columns.
        #[serde(default = "default_columns")]
        columns: usize,
    },
    /// Title and one tall content block with tight spacing.
    CompactList,
    /// Items alternating left/right of a vertical spine.
    ZigzagTimeline {
        /// Number of timeline items.
        #[serde(rename = "itemCount", default = "default_item_count")]
        item_count: usize,
    },
    /// Numbered items stacked down the slide.
    Pyramid {
        /// Number of items.
        #[serde(rename = "itemCount", default = "default_item_count")]
        item_count: usize,
    },
    /// Title band above a single content block.
    StandardText {
        /// Height of the title band.
        #[serde(rename = "titleHeight", default = "default_title_height")]
        title_height: f64,
    },
}

fn default_columns() -> usize {
    2
}

fn default_item_count() -> usize {
    1
}

fn default_title_height() -> f64 {
    DEFAULT_TITLE_HEIGHT
}

impl Default for LayoutChoice {
    fn default() -> Self {
        Self::StandardText {
            title_height: DEFAULT_TITLE_HEIGHT,
        }
    }
}

impl LayoutChoice {
    /// Archetype name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::TitleSpecial { .. } => "title-special",
            Self::Coordinate { .. } => "coordinate",
            Self::ImageContentStack => "image-content-stack",
            Self::ImageFocus { .. } => "image-focus",
            Self::AlternatingSplit { .. } => "alternating-split",
            Self::MultiColumn { .. } => "multi-column",
            Self::CompactList => "compact-list",
            Self::ZigzagTimeline { .. } => "zigzag-timeline",
            Self::Pyramid { .. } => "pyramid",
            Self::StandardText { .. } => "standard-text",
        }
    }

    /// Resolve an archetype by name and untyped parameters.
    ///
    /// Unknown names or malformed parameters resolve to the standard text
    /// layout.
    #[must_use]
    pub fn from_name(name: &str, params: &serde_json::Value) -> Self {
        // Unit archetypes reject a params object, so retry without one.
        let with_params = serde_json::json!({ "name": name, "params": params });
        let bare = serde_json::json!({ "name": name });
        serde_json::from_value(with_params)
            .or_else(|_| serde_json::from_value(bare))
            .unwrap_or_else(|e| {
                tracing::debug!(
                    "Unknown layout archetype {:?} ({}), using standard-text",
                    name,
                    e
                );
                Self::default()
            })
    }
}

/// Title band height for the standard text layout, growing with title length.
#[must_use]
pub fn title_height_for(title: &str) -> f64 {
    let len = text_length(title);
    if len > 100 {
        0.25
    } else if len > 50 {
        0.2
    } else {
        DEFAULT_TITLE_HEIGHT
    }
}

/// Choose the layout archetype for `slide` at position `index` in the deck.
#[must_use]
pub fn classify(slide: &Slide, index: usize) -> LayoutChoice {
    let content = parse_content(slide.content.as_deref());
    classify_parsed(slide, &content, index)
}

/// [`classify`] with content that has already been parsed.
#[must_use]
pub fn classify_parsed(slide: &Slide, content: &ParsedContent, index: usize) -> LayoutChoice {
    let has_image = slide.has_image();

    if slide.slide_type.is_title_like() {
        return LayoutChoice::TitleSpecial { has_image };
    }

    if slide.slide_type == SlideType::Coordinate {
        if let Some(positions) = slide.layout_positions() {
            return LayoutChoice::Coordinate { positions };
        }
    }

    let density = ContentDensity::of(content);
    let items = content.total_items();
    let is_image_left = index % 2 == 0;

    if has_image {
        return match density {
            ContentDensity::VeryDense => LayoutChoice::ImageContentStack,
            ContentDensity::Sparse => LayoutChoice::ImageFocus { is_image_left },
            _ => LayoutChoice::AlternatingSplit { is_image_left },
        };
    }

    if density == ContentDensity::VeryDense {
        return if items > 12 {
            LayoutChoice::MultiColumn { columns: 2 }
        } else {
            LayoutChoice::CompactList
        };
    }

    match items {
        5..=9 => LayoutChoice::ZigzagTimeline { item_count: items },
        3..=4 => LayoutChoice::Pyramid { item_count: items },
        _ => LayoutChoice::StandardText {
            title_height: title_height_for(&slide.title),
        },
    }
}
